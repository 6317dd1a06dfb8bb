//! Progress reporting seam.
//!
//! Core logic reports through [`Reporter`] without knowing how (or whether)
//! anything is printed.

use foundryup_schema::Tag;

/// Receives user-facing progress from the install flow.
pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Fetching", "Installing").
    fn section(&self, title: &str);

    /// Marks one binary as placed, with its self-reported version.
    fn done(&self, name: &str, tag: &Tag, detail: &str);

    /// Marks one binary as failed with a specific reason.
    fn failed(&self, name: &str, tag: &Tag, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn done(&self, _: &str, _: &Tag, _: &str) {}
    fn failed(&self, _: &str, _: &Tag, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}

/// Captures warnings and completions so tests can assert on them.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    pub(crate) warnings: std::sync::Mutex<Vec<String>>,
    pub(crate) done: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn section(&self, _: &str) {}
    fn done(&self, name: &str, _: &Tag, detail: &str) {
        self.done
            .lock()
            .unwrap()
            .push((name.to_string(), detail.to_string()));
    }
    fn failed(&self, _: &str, _: &Tag, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }
}
