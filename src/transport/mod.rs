//! Stream sources for a boot test.
//!
//! A transport binds the orchestrator's stream during SETUP and may
//! contribute prelude subtests. The run loop itself never knows whether the
//! target is a physical UART, a spawned emulator, or an emulator bridged
//! through a forwarder.

mod chainboot;
mod direct;

pub use chainboot::ChainbootTransport;
pub use direct::{DirectSource, DirectTransport};

use crate::error::TransportError;
use crate::output::OutputLog;
use crate::process::BackgroundProcesses;
use crate::stream::LineStream;
use crate::subtest::Subtest;

/// Result of binding a transport.
pub struct Connection {
    pub stream: LineStream,
    /// Steps that must run before any target step.
    pub prelude: Vec<Box<dyn Subtest>>,
}

impl Connection {
    pub fn new(stream: LineStream) -> Self {
        Self {
            stream,
            prelude: Vec::new(),
        }
    }

    pub fn with_prelude(mut self, subtest: impl Subtest + 'static) -> Self {
        self.prelude.push(Box::new(subtest));
        self
    }
}

pub trait Transport {
    /// One-line description for reports.
    fn describe(&self) -> String;

    /// SETUP: open endpoints, start helpers, and hand back the stream.
    fn connect(&mut self, processes: &mut BackgroundProcesses)
        -> Result<Connection, TransportError>;

    /// FINISH post-processing, applied to the log of a passed run only.
    fn finalize(&self, _log: &mut OutputLog) {}

    /// FINISH teardown; release any endpoints held for the run.
    fn release(&mut self) {}
}
