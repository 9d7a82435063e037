//! Shared test fixtures for dagrun crates.

use std::sync::{Arc, Mutex};

use dagrun_core::step::{StepReader, StepRef, StepStatus};
use tracing_subscriber::EnvFilter;

/// A step whose status can be changed from the test body.
pub struct MockStep {
    name: String,
    status: Mutex<StepStatus>,
}

impl MockStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Mutex::new(StepStatus::Pending),
        }
    }

    pub fn with_status(self, status: StepStatus) -> Self {
        self.set_status(status);
        self
    }

    pub fn set_status(&self, status: StepStatus) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }
}

impl StepReader for MockStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> StepStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared mock step, for tests that change its status later.
pub fn mock_step(name: &str, status: StepStatus) -> Arc<MockStep> {
    Arc::new(MockStep::new(name).with_status(status))
}

/// Step handle with a fixed status.
pub fn step_ref(name: &str, status: StepStatus) -> StepRef {
    StepRef::from(mock_step(name, status))
}

/// Install a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dagrun_core=debug,warn")),
        )
        .with_test_writer()
        .try_init();
}
