//! Progress reporting and cooperative cancellation.
//!
//! The pipeline polls cancellation at item boundaries only; no extraction is
//! interrupted mid-flight.

/// Receives progress updates and answers cancellation polls.
pub trait ProgressReporter {
    /// Report progress after starting work on item `current` of `total`.
    fn update(&self, current: usize, total: usize, message: &str);

    /// Whether the user asked to stop. Checked once per item, before the
    /// item starts.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Null reporter for library use without a UI.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&self, _current: usize, _total: usize, _message: &str) {}
}

/// Console reporter used by the CLI.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    verbose: bool,
}

impl ConsoleProgress {
    /// Create a console reporter.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn update(&self, current: usize, total: usize, message: &str) {
        if self.verbose {
            println!("[{}/{}] {}", current, total, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_never_cancels() {
        let progress = NoProgress;
        progress.update(1, 3, "checking");
        assert!(!progress.is_cancelled());
    }
}
