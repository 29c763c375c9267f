//! Directly-attached targets.
//!
//! Either a command that *is* the target (typically an emulator with its
//! serial port on stdio), run on a fresh pty, or a serial device node that
//! has already been configured (baud rate etc.) outside this tool.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::info;

use super::{Connection, Transport};
use crate::error::TransportError;
use crate::process::{BackgroundProcesses, Endpoint, Launch};
use crate::pty::PtyPair;
use crate::stream::LineStream;

#[derive(Debug, Clone)]
pub enum DirectSource {
    Command(String),
    Device(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DirectTransport {
    source: DirectSource,
    terminator: String,
    echo: bool,
}

impl DirectTransport {
    pub fn command(command: impl Into<String>, terminator: impl Into<String>) -> Self {
        Self {
            source: DirectSource::Command(command.into()),
            terminator: terminator.into(),
            echo: false,
        }
    }

    pub fn device(path: impl Into<PathBuf>, terminator: impl Into<String>) -> Self {
        Self {
            source: DirectSource::Device(path.into()),
            terminator: terminator.into(),
            echo: false,
        }
    }

    pub fn echo(mut self, enabled: bool) -> Self {
        self.echo = enabled;
        self
    }
}

impl Transport for DirectTransport {
    fn describe(&self) -> String {
        match &self.source {
            DirectSource::Command(cmd) => format!("target command: {cmd}"),
            DirectSource::Device(path) => format!("serial device: {}", path.display()),
        }
    }

    fn connect(
        &mut self,
        processes: &mut BackgroundProcesses,
    ) -> Result<Connection, TransportError> {
        let stream = match &self.source {
            DirectSource::Command(cmd) => {
                let pty = PtyPair::open().map_err(TransportError::Pty)?;
                let launch = Launch::new(cmd.clone())
                    .stdin(Endpoint::File(pty.secondary.try_clone()?))
                    .stdout(Endpoint::File(pty.secondary.try_clone()?))
                    .stderr(Endpoint::File(pty.secondary));
                processes
                    .spawn(&launch)
                    .map_err(|source| TransportError::Spawn {
                        command: cmd.clone(),
                        source,
                    })?;
                // `launch` drops our secondary handles here, so the stream
                // sees end-of-stream once the target exits.
                drop(launch);
                LineStream::from_fd(pty.main.try_clone()?, pty.main, &self.terminator)
            }
            DirectSource::Device(path) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .map_err(|source| TransportError::Device {
                        path: path.display().to_string(),
                        source,
                    })?;
                info!(device = %path.display(), "opened serial device");
                LineStream::from_fd(file.try_clone()?, file, &self.terminator)
            }
        };

        Ok(Connection::new(stream.echo(self.echo)))
    }
}
