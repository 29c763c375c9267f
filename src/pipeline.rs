//! Ordered subtest sequence for one run.
//!
//! Transports contribute prelude steps (handshakes) that must run before any
//! target step. The order is fixed when the pipeline is assembled and cannot
//! be changed afterwards.

use crate::subtest::Subtest;

pub struct Pipeline {
    stages: Vec<Box<dyn Subtest>>,
}

impl Pipeline {
    /// Prelude steps first, then target steps, each group in given order.
    pub fn assemble(prelude: Vec<Box<dyn Subtest>>, target: Vec<Box<dyn Subtest>>) -> Self {
        let mut stages = prelude;
        stages.extend(target);
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }
}

impl IntoIterator for Pipeline {
    type Item = Box<dyn Subtest>;
    type IntoIter = std::vec::IntoIter<Box<dyn Subtest>>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}
