//! Boot test configuration.
//!
//! Values come from a TOML file (explicit path, or `BOOT_TESTS_CONFIG`),
//! falling back to defaults suited for chainloading a demo payload through
//! QEMU. Command line flags override file values in the binaries.

use crate::cleanup::LineCleanup;
use crate::error::ConfigError;
use crate::markers::DEFAULT_EXPECTED_PRINT;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file when `--config` is not given.
pub const ENV_CONFIG_PATH: &str = "BOOT_TESTS_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootTestConfig {
    /// Deadline for each target expectation.
    pub expect_timeout_secs: u64,
    /// Deadline for the forwarder's power request.
    pub handshake_timeout_secs: u64,
    /// Line terminator for pty-backed streams.
    pub line_terminator: String,
    /// Line terminator for raw serial device nodes.
    pub device_terminator: String,
    /// Replacement text for carriage-return progress segments.
    pub collapse_marker: String,
    /// Number of trailing lines shown when a subtest fails.
    pub tail_lines: usize,
    /// Print every observed line as it arrives.
    pub echo: bool,
    /// Forwarder invocation; the secondary pty path and payload are appended.
    pub forwarder: String,
    /// Marker that signals the payload booted.
    pub expected_print: String,
}

impl Default for BootTestConfig {
    fn default() -> Self {
        Self {
            expect_timeout_secs: 10,
            handshake_timeout_secs: 30,
            line_terminator: "\r\n".to_string(),
            device_terminator: "\n".to_string(),
            collapse_marker: "  ".to_string(),
            tail_lines: 30,
            echo: false,
            forwarder: "ruby ../tools/serial/minipush.rb".to_string(),
            expected_print: DEFAULT_EXPECTED_PRINT.to_string(),
        }
    }
}

impl BootTestConfig {
    /// Load from `path`, else from `$BOOT_TESTS_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
        };
        match path {
            Some(p) => Self::from_file(&p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Reading config {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Parsing config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expect_timeout_secs == 0 {
            return Err(ConfigError::Zero("expect_timeout_secs"));
        }
        if self.handshake_timeout_secs == 0 {
            return Err(ConfigError::Zero("handshake_timeout_secs"));
        }
        if self.line_terminator.is_empty() {
            return Err(ConfigError::Empty("line_terminator"));
        }
        if self.device_terminator.is_empty() {
            return Err(ConfigError::Empty("device_terminator"));
        }
        if self.forwarder.trim().is_empty() {
            return Err(ConfigError::Empty("forwarder"));
        }
        if self.expected_print.is_empty() {
            return Err(ConfigError::Empty("expected_print"));
        }
        if self.collapse_marker.contains('\r') {
            return Err(ConfigError::MarkerHasCarriageReturn);
        }
        Ok(())
    }

    pub fn expect_timeout(&self) -> Duration {
        Duration::from_secs(self.expect_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn cleanup(&self) -> LineCleanup {
        LineCleanup::new(self.collapse_marker.clone())
    }
}
