//! Subtests: one expectation (and optionally one action) each.
//!
//! A boot test is an ordered list of subtests sharing a single live stream.
//! Only one subtest holds the stream at a time; its expectation consumes
//! lines until the marker shows up or its deadline passes. Nothing is ever
//! rewound, so a line consumed by subtest N is never seen by subtest N+1.
//!
//! # Variants
//!
//! - [`ExpectedPrint`] - wait for a marker, nothing else
//! - [`Handshake`] - wait for a marker, then perform one [`SideEffect`]

mod expectation;
mod expected_print;
mod handshake;

pub use expectation::Expectation;
pub use expected_print::ExpectedPrint;
pub use handshake::{Handshake, SideEffect};

use crate::error::SubtestError;
use crate::output::OutputLog;
use crate::process::BackgroundProcesses;
use crate::stream::LineStream;

/// Everything a running subtest may touch.
pub struct SubtestContext<'a> {
    pub stream: &'a mut LineStream,
    pub log: &'a mut OutputLog,
    pub processes: &'a mut BackgroundProcesses,
}

/// A single step of a boot test.
pub trait Subtest {
    /// Name shown in progress output and failure reports.
    fn name(&self) -> &str;

    /// Consume the stream until this step's expectation holds, then perform
    /// its side effect (if any).
    fn run(&mut self, ctx: &mut SubtestContext<'_>) -> Result<(), SubtestError>;
}
