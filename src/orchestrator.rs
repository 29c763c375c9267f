//! The generic boot test run loop.
//!
//! ```text
//! INIT -> SETUP -> RUNNING(0..n) -> FINISH -> PASSED | FAILED
//! ```
//!
//! SETUP binds the transport and assembles the pipeline; RUNNING executes
//! subtests strictly in order and stops at the first failure; FINISH always
//! runs. There are no retries: a flaky boot test means the timing or the
//! markers need fixing.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::output::OutputLog;
use crate::pipeline::Pipeline;
use crate::process::BackgroundProcesses;
use crate::report;
use crate::subtest::{Subtest, SubtestContext};
use crate::transport::Transport;

/// Lifecycle phase, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Setup,
    Running(usize),
    Finish,
}

/// Per-subtest result.
#[derive(Debug, Clone, Serialize)]
pub struct SubtestRecord {
    /// 1-based position in the pipeline.
    pub ordinal: usize,
    pub name: String,
    pub passed: bool,
    pub duration_secs: f64,
}

/// Terminal result of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootOutcome {
    Passed,
    Failed {
        /// Failing subtest; `"setup"` when the transport could not be bound.
        subtest: String,
        /// 1-based pipeline position, 0 for setup failures.
        ordinal: usize,
        kind: String,
        reason: String,
        /// Raw output up to the failure, never cleaned.
        captured: Vec<String>,
    },
}

impl BootOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, BootOutcome::Passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BootReport {
    pub test_name: String,
    pub description: String,
    pub outcome: BootOutcome,
    pub subtests: Vec<SubtestRecord>,
    /// Final output log. Cleaned only when the run passed.
    pub output: Vec<String>,
    pub duration_secs: f64,
}

impl BootReport {
    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }
}

pub struct BootTest<T: Transport> {
    name: String,
    transport: T,
    subtests: Vec<Box<dyn Subtest>>,
    tail_lines: usize,
    progress: bool,
}

impl<T: Transport> BootTest<T> {
    pub fn new(name: impl Into<String>, transport: T) -> Self {
        Self {
            name: name.into(),
            transport,
            subtests: Vec::new(),
            tail_lines: 30,
            progress: false,
        }
    }

    /// Append a target subtest. Transport prelude steps always run first.
    pub fn subtest(mut self, subtest: impl Subtest + 'static) -> Self {
        self.subtests.push(Box::new(subtest));
        self
    }

    /// Lines of output kept in a failure report.
    pub fn tail_lines(mut self, n: usize) -> Self {
        self.tail_lines = n;
        self
    }

    /// Print step progress to stdout while running.
    pub fn progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn run(mut self) -> BootReport {
        let started = Instant::now();
        let description = self.transport.describe();
        let mut phase = Phase::Init;
        debug!(?phase, test = %self.name, "boot test created");

        let mut log = OutputLog::new();
        let mut processes = BackgroundProcesses::new();
        let mut records = Vec::new();

        phase = Phase::Setup;
        debug!(?phase, "binding transport");
        let outcome = match self.transport.connect(&mut processes) {
            Ok(connection) => {
                let mut stream = connection.stream;
                let target = std::mem::take(&mut self.subtests);
                let pipeline = Pipeline::assemble(connection.prelude, target);
                info!(steps = ?pipeline.names(), "pipeline assembled");

                let mut outcome = BootOutcome::Passed;
                for (idx, mut subtest) in pipeline.into_iter().enumerate() {
                    phase = Phase::Running(idx);
                    debug!(?phase, subtest = subtest.name(), "running");
                    let ordinal = idx + 1;
                    if self.progress {
                        report::step_started(ordinal, subtest.name());
                    }

                    let step_start = Instant::now();
                    let result = {
                        let mut ctx = SubtestContext {
                            stream: &mut stream,
                            log: &mut log,
                            processes: &mut processes,
                        };
                        subtest.run(&mut ctx)
                    };
                    let elapsed = step_start.elapsed();
                    if self.progress {
                        report::step_finished(result.is_ok(), elapsed);
                    }
                    records.push(SubtestRecord {
                        ordinal,
                        name: subtest.name().to_string(),
                        passed: result.is_ok(),
                        duration_secs: elapsed.as_secs_f64(),
                    });

                    if let Err(err) = result {
                        outcome = BootOutcome::Failed {
                            subtest: subtest.name().to_string(),
                            ordinal,
                            kind: err.kind().to_string(),
                            reason: err.to_string(),
                            captured: log.tail(self.tail_lines).to_vec(),
                        };
                        break;
                    }
                }
                drop(stream);
                outcome
            }
            Err(err) => BootOutcome::Failed {
                subtest: "setup".to_string(),
                ordinal: 0,
                kind: "SetupError".to_string(),
                reason: err.to_string(),
                captured: Vec::new(),
            },
        };

        phase = Phase::Finish;
        debug!(?phase, passed = outcome.passed(), "finishing");
        if outcome.passed() {
            self.transport.finalize(&mut log);
        }
        processes.shutdown();
        self.transport.release();

        let duration = started.elapsed();
        info!(passed = outcome.passed(), secs = duration.as_secs_f64(), "boot test done");

        BootReport {
            test_name: self.name,
            description,
            outcome,
            subtests: records,
            output: log.into_lines(),
            duration_secs: round_secs(duration),
        }
    }
}

fn round_secs(d: Duration) -> f64 {
    (d.as_secs_f64() * 1000.0).round() / 1000.0
}
