//! Error taxonomy for boot tests.
//!
//! Every failure is terminal for the run: nothing here is retried. The
//! variants carry the lines observed so far so the report can show exactly
//! what the target emitted before things went wrong.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Outcome of the single blocking read primitive.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    /// The deadline passed without a complete line.
    #[error("deadline elapsed before a complete line arrived")]
    TimedOut,
    /// The source reached end-of-stream. `partial` holds any bytes received
    /// after the last terminator.
    #[error("stream closed before a line terminator was seen")]
    Closed { partial: String },
}

/// Failure of a single subtest.
#[derive(Debug, Error)]
pub enum SubtestError {
    #[error("timed out after {}s waiting for '{marker}'", .timeout.as_secs_f64())]
    Timeout {
        marker: String,
        timeout: Duration,
        observed: Vec<String>,
    },

    #[error("stream closed while waiting for '{marker}'")]
    StreamClosed {
        marker: String,
        observed: Vec<String>,
        partial: String,
    },

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to stream: {source}")]
    Write {
        #[source]
        source: io::Error,
    },
}

impl SubtestError {
    /// Short machine-friendly name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            SubtestError::Timeout { .. } => "TimeoutError",
            SubtestError::StreamClosed { .. } => "ExpectationError",
            SubtestError::Spawn { .. } => "SpawnError",
            SubtestError::Write { .. } => "WriteError",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SubtestError::Timeout { .. })
    }
}

/// Failure while binding the stream source (the SETUP phase).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to allocate pseudo-terminal: {0}")]
    Pty(#[source] io::Error),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open serial device {path}: {source}")]
    Device {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("collapse_marker must not contain a carriage return")]
    MarkerHasCarriageReturn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_marker() {
        let err = SubtestError::Timeout {
            marker: "Echoing input now".to_string(),
            timeout: Duration::from_secs(10),
            observed: vec![],
        };
        assert_eq!(
            err.to_string(),
            "timed out after 10s waiting for 'Echoing input now'"
        );
        assert_eq!(err.kind(), "TimeoutError");
        assert!(err.is_timeout());
    }

    #[test]
    fn stream_closed_is_not_timeout() {
        let err = SubtestError::StreamClosed {
            marker: "x".to_string(),
            observed: vec![],
            partial: String::new(),
        };
        assert!(!err.is_timeout());
        assert_eq!(err.kind(), "ExpectationError");
    }
}
