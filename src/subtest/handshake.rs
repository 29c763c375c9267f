//! Synchronization subtests: wait for a marker, then act.
//!
//! The action is started strictly after the marker was consumed. Starting it
//! earlier would let the spawned side write into the very stream that is
//! still being matched.

use std::time::Duration;
use tracing::info;

use super::{Expectation, Subtest, SubtestContext};
use crate::error::SubtestError;
use crate::markers::POWER_TARGET_REQUEST;
use crate::process::Launch;

/// The single externally observable action of a handshake.
#[derive(Debug)]
pub enum SideEffect {
    /// Launch a detached process. It is registered for teardown but never
    /// waited on; if it dies, the run only notices through missing output.
    Spawn(Launch),
    /// Send control bytes back over the stream.
    Write(Vec<u8>),
}

pub struct Handshake {
    name: String,
    expectation: Expectation,
    effect: SideEffect,
}

impl Handshake {
    pub fn new(name: impl Into<String>, expectation: Expectation, effect: SideEffect) -> Self {
        Self {
            name: name.into(),
            expectation,
            effect,
        }
    }

    /// Wait for the forwarder's power request, then launch the emulator.
    pub fn power_target_request(emulator: Launch, timeout: Duration) -> Self {
        Self::new(
            "Waiting for request to power target",
            Expectation::new(POWER_TARGET_REQUEST, timeout),
            SideEffect::Spawn(emulator),
        )
    }
}

impl Subtest for Handshake {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &mut SubtestContext<'_>) -> Result<(), SubtestError> {
        self.expectation.wait(ctx)?;

        match &self.effect {
            SideEffect::Spawn(launch) => {
                let pid = ctx
                    .processes
                    .spawn(launch)
                    .map_err(|source| SubtestError::Spawn {
                        command: launch.command().to_string(),
                        source,
                    })?;
                info!(pid, subtest = %self.name, "handshake complete, process launched");
            }
            SideEffect::Write(bytes) => {
                ctx.stream
                    .write(bytes)
                    .map_err(|source| SubtestError::Write { source })?;
                info!(len = bytes.len(), subtest = %self.name, "handshake complete, bytes sent");
            }
        }
        Ok(())
    }
}
