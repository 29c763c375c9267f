//! Accumulated target output for one run.

use crate::cleanup::LineCleanup;

/// Ordered, append-only record of every observed line.
///
/// Owned by the orchestrator. It is only mutated by subtests while they hold
/// the stream, and once more by the finalization pass on success.
#[derive(Debug, Default, Clone)]
pub struct OutputLog {
    lines: Vec<String>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Last `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> &[String] {
        let start = self.lines.len().saturating_sub(n);
        &self.lines[start..]
    }

    pub fn collapse(&mut self, cleanup: &LineCleanup) {
        cleanup.apply(&mut self.lines);
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_is_bounded() {
        let mut log = OutputLog::new();
        for i in 0..5 {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.tail(2), ["line 3", "line 4"]);
        assert_eq!(log.tail(50).len(), 5);
    }
}
