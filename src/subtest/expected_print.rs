//! Wait for a marker printed by the target.

use std::time::Duration;

use super::{Expectation, Subtest, SubtestContext};
use crate::error::SubtestError;

/// Passes once the target prints `marker`.
pub struct ExpectedPrint {
    name: String,
    expectation: Expectation,
}

impl ExpectedPrint {
    pub fn new(marker: impl Into<String>, timeout: Duration) -> Self {
        let expectation = Expectation::new(marker, timeout);
        Self {
            name: format!("Checking for the string: '{}'", expectation.marker),
            expectation,
        }
    }

    /// Override the displayed name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Subtest for ExpectedPrint {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &mut SubtestContext<'_>) -> Result<(), SubtestError> {
        self.expectation.wait(ctx)?;
        Ok(())
    }
}
