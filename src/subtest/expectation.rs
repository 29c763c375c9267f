//! The expect-or-fail primitive shared by every subtest.

use std::time::{Duration, Instant};
use tracing::debug;

use super::SubtestContext;
use crate::error::{ReadError, SubtestError};
use crate::stream::ansi::strip_ansi_codes;

/// A marker and the time allowed for it to appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub marker: String,
    pub timeout: Duration,
}

impl Expectation {
    pub fn new(marker: impl Into<String>, timeout: Duration) -> Self {
        Self {
            marker: marker.into(),
            timeout,
        }
    }

    /// Substring match against the line with escape sequences removed.
    pub fn matches(&self, line: &str) -> bool {
        strip_ansi_codes(line).contains(&self.marker)
    }

    /// Read lines until one contains the marker. Every line read, including
    /// the matching one, is appended to the log. Returns the matching line.
    pub fn wait(&self, ctx: &mut SubtestContext<'_>) -> Result<String, SubtestError> {
        let deadline = Instant::now() + self.timeout;
        let mut observed = Vec::new();

        loop {
            match ctx.stream.read_line_until(deadline) {
                Ok(line) => {
                    ctx.log.push(line.clone());
                    if self.matches(&line) {
                        debug!(marker = %self.marker, "expectation met");
                        return Ok(line);
                    }
                    observed.push(line);
                }
                Err(ReadError::TimedOut) => {
                    return Err(SubtestError::Timeout {
                        marker: self.marker.clone(),
                        timeout: self.timeout,
                        observed,
                    });
                }
                Err(ReadError::Closed { partial }) => {
                    if !partial.is_empty() {
                        ctx.log.push(partial.clone());
                    }
                    return Err(SubtestError::StreamClosed {
                        marker: self.marker.clone(),
                        observed,
                        partial,
                    });
                }
            }
        }
    }
}
