//! Post-processing of the finalized output log.
//!
//! Bridged transports print progress as `12%\r34%\r...`, overwriting the
//! terminal line in place. For the stored log only the text after the last
//! carriage return is meaningful; everything before it is replaced by a short
//! marker.

/// Replacement rule for carriage-return progress segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCleanup {
    /// Text substituted for everything up to and including the last `\r`.
    pub marker: String,
}

impl Default for LineCleanup {
    fn default() -> Self {
        Self {
            marker: "  ".to_string(),
        }
    }
}

impl LineCleanup {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Collapse a single line. Lines without `\r` are returned unchanged.
    ///
    /// Idempotent as long as the marker itself contains no `\r`, which the
    /// configuration layer enforces.
    pub fn collapse(&self, line: &str) -> String {
        match line.rfind('\r') {
            Some(idx) => format!("{}{}", self.marker, &line[idx + 1..]),
            None => line.to_string(),
        }
    }

    /// Collapse every line in place.
    pub fn apply(&self, lines: &mut [String]) {
        for line in lines.iter_mut() {
            if line.contains('\r') {
                *line = self.collapse(line);
            }
        }
    }
}
