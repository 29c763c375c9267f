//! Emulated target reached through a serial forwarder.
//!
//! Two pty pairs are involved:
//!
//! ```text
//!   emulator stdio <-> bridge.main   bridge.secondary <-> forwarder (opens by path)
//!   forwarder stdio -> console.secondary   console.main -> LineStream
//! ```
//!
//! The stream under test is the forwarder's own terminal, so forwarder
//! diagnostics and target output (relayed by the forwarder) arrive on the
//! same line stream. The emulator is only launched after the forwarder asks
//! for the target to be powered; until then nothing listens on the bridge.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::{Connection, Transport};
use crate::cleanup::LineCleanup;
use crate::config::BootTestConfig;
use crate::error::TransportError;
use crate::output::OutputLog;
use crate::process::{BackgroundProcesses, Endpoint, Launch};
use crate::pty::PtyPair;
use crate::stream::LineStream;
use crate::subtest::Handshake;

pub struct ChainbootTransport {
    emulator_command: String,
    payload: PathBuf,
    forwarder: String,
    terminator: String,
    handshake_timeout: Duration,
    cleanup: LineCleanup,
    echo: bool,
    /// Held for the duration of the run so the forwarder can open the
    /// secondary by path and the emulator always has a peer.
    bridge: Option<PtyPair>,
}

impl ChainbootTransport {
    pub fn new(
        emulator_command: impl Into<String>,
        payload: impl Into<PathBuf>,
        config: &BootTestConfig,
    ) -> Self {
        Self {
            emulator_command: emulator_command.into(),
            payload: payload.into(),
            forwarder: config.forwarder.clone(),
            terminator: config.line_terminator.clone(),
            handshake_timeout: config.handshake_timeout(),
            cleanup: config.cleanup(),
            echo: config.echo,
            bridge: None,
        }
    }

    /// Command line used to start the forwarder for a given secondary path.
    pub fn forwarder_command(&self, secondary: &Path) -> Result<String, TransportError> {
        let secondary = secondary.display().to_string();
        let payload = self.payload.display().to_string();
        let args = shlex::try_join([secondary.as_str(), payload.as_str()])
            .map_err(|e| TransportError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        Ok(format!("{} {}", self.forwarder, args))
    }
}

impl Transport for ChainbootTransport {
    fn describe(&self) -> String {
        format!(
            "chainboot of {} via '{}'",
            self.payload.display(),
            self.forwarder
        )
    }

    fn connect(
        &mut self,
        processes: &mut BackgroundProcesses,
    ) -> Result<Connection, TransportError> {
        let bridge = PtyPair::open().map_err(TransportError::Pty)?;
        let console = PtyPair::open().map_err(TransportError::Pty)?;

        let forwarder_cmd = self.forwarder_command(&bridge.secondary_path)?;
        let forwarder = Launch::new(forwarder_cmd.clone())
            .stdin(Endpoint::File(console.secondary.try_clone()?))
            .stdout(Endpoint::File(console.secondary.try_clone()?))
            .stderr(Endpoint::File(console.secondary));
        processes
            .spawn(&forwarder)
            .map_err(|source| TransportError::Spawn {
                command: forwarder_cmd,
                source,
            })?;
        drop(forwarder);
        info!(bridge = %bridge.secondary_path.display(), "forwarder started");

        let stream = LineStream::from_fd(console.main.try_clone()?, console.main, &self.terminator)
            .echo(self.echo);

        let emulator = Launch::new(self.emulator_command.clone())
            .stdin(Endpoint::File(bridge.main.try_clone()?))
            .stdout(Endpoint::File(bridge.main.try_clone()?))
            .stderr(Endpoint::Null);
        self.bridge = Some(bridge);

        Ok(Connection::new(stream)
            .with_prelude(Handshake::power_target_request(emulator, self.handshake_timeout)))
    }

    fn finalize(&self, log: &mut OutputLog) {
        log.collapse(&self.cleanup);
    }

    fn release(&mut self) {
        self.bridge = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarder_gets_secondary_path_then_payload() {
        let mut config = BootTestConfig::default();
        config.forwarder = "ruby minipush.rb".to_string();
        let transport =
            ChainbootTransport::new("qemu-system-aarch64 -M raspi3b", "my kernel.img", &config);

        let command = transport.forwarder_command(Path::new("/dev/pts/9")).unwrap();
        assert_eq!(
            shlex::split(&command).unwrap(),
            ["ruby", "minipush.rb", "/dev/pts/9", "my kernel.img"]
        );
        assert!(transport.describe().contains("my kernel.img"));
    }

    #[test]
    fn finalize_collapses_progress_lines() {
        let mut config = BootTestConfig::default();
        config.collapse_marker = "> ".to_string();
        let transport = ChainbootTransport::new("true", "demo.img", &config);

        let mut log = OutputLog::new();
        log.push("[MP] Sending 10%\r[MP] Sending 100%");
        transport.finalize(&mut log);
        assert_eq!(log.lines(), ["> [MP] Sending 100%"]);
    }
}
