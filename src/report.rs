//! Diagnostic sink for pipeline progress and per-item failures.
//!
//! The pipeline never writes to the terminal directly. Hosts pass a
//! [`Reporter`]; the CLI uses [`LogReporter`], which forwards to the `log`
//! facade, and tests capture messages with `RecordingReporter`.

use std::error::Error;

/// Receives informational, warning, and error messages from a run.
pub trait Reporter {
    /// Records an informational message.
    fn info(&self, message: &str);

    /// Records a warning.
    fn warn(&self, message: &str);

    /// Records an error.
    fn error(&self, message: &str);
}

/// Forwards messages to the `log` crate under the `protostage` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        log::info!(target: "protostage", "{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "protostage", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "protostage", "{message}");
    }
}

/// Formats an error followed by each of its sources, separated by `: `.
///
/// # Examples
///
/// ```
/// use protostage::report::error_chain;
///
/// let inner = std::io::Error::other("disk full");
/// let outer = protostage::error::StageError::ExtractWrite {
///     path: "/tmp/out/a.proto".into(),
///     source: inner,
/// };
/// assert_eq!(error_chain(&outer), "could not write /tmp/out/a.proto: disk full");
/// ```
#[must_use]
pub fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        rendered.push_str(": ");
        rendered.push_str(&source.to_string());
        current = source.source();
    }
    rendered
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::{Level, RecordingReporter};

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::Reporter;
    use std::cell::RefCell;

    /// Severity attached to a recorded message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        /// Informational output.
        Info,
        /// A warning.
        Warn,
        /// An error.
        Error,
    }

    /// Collects messages in memory for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingReporter {
        messages: RefCell<Vec<(Level, String)>>,
    }

    impl RecordingReporter {
        /// Creates an empty recorder.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns every recorded message in order.
        #[must_use]
        pub fn messages(&self) -> Vec<(Level, String)> {
            self.messages.borrow().clone()
        }

        /// Returns the messages recorded at `level`.
        #[must_use]
        pub fn at(&self, level: Level) -> Vec<String> {
            self.messages
                .borrow()
                .iter()
                .filter(|(recorded, _)| *recorded == level)
                .map(|(_, message)| message.clone())
                .collect()
        }

        /// Returns true if any message at `level` contains `needle`.
        #[must_use]
        pub fn contains(&self, level: Level, needle: &str) -> bool {
            self.at(level).iter().any(|message| message.contains(needle))
        }

        fn push(&self, level: Level, message: &str) {
            self.messages.borrow_mut().push((level, message.to_owned()));
        }
    }

    impl Reporter for RecordingReporter {
        fn info(&self, message: &str) {
            self.push(Level::Info, message);
        }

        fn warn(&self, message: &str) {
            self.push(Level::Warn, message);
        }

        fn error(&self, message: &str) {
            self.push(Level::Error, message);
        }
    }
}
