//! Serial boot-test orchestrator for embedded targets.
//!
//! Drives a target (real hardware or an emulator) through its boot over a
//! line-oriented serial stream and asserts that expected markers appear in
//! order, within bounded time:
//! - `LineStream` - blocking, deadline-bounded line reads over raw bytes
//! - `Subtest` - one expectation plus an optional side effect
//! - `BootTest` - ordered run loop with a single pass/fail verdict
//! - `Transport` - binds the stream: direct device/command, or an emulator
//!   bridged through a serial forwarder (`ChainbootTransport`)

pub mod cleanup;
pub mod config;
pub mod error;
pub mod logging;
pub mod markers;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod pty;
pub mod report;
pub mod stream;
pub mod subtest;
pub mod transport;

pub use cleanup::LineCleanup;
pub use config::BootTestConfig;
pub use error::{ConfigError, ReadError, SubtestError, TransportError};
pub use orchestrator::{BootOutcome, BootReport, BootTest, SubtestRecord};
pub use output::OutputLog;
pub use pipeline::Pipeline;
pub use process::{BackgroundProcesses, Endpoint, Launch};
pub use stream::LineStream;
pub use subtest::{Expectation, ExpectedPrint, Handshake, SideEffect, Subtest, SubtestContext};
pub use transport::{ChainbootTransport, Connection, DirectSource, DirectTransport, Transport};
