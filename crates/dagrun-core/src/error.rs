use thiserror::Error;

use crate::flow::FlowError;
use crate::guard::PanicError;
use crate::lifecycle::LifecycleError;
use crate::precondition::{CycleReport, InvalidInitialStatus};
use crate::workflow::WorkflowError;

/// Any error a step may produce.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DagrunError {
    // Step errors
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Panic(#[from] PanicError),

    #[error("Result already recorded for step: {0}")]
    DuplicateResult(String),

    // Startup errors
    #[error(transparent)]
    InvalidInitialStatus(#[from] InvalidInitialStatus),

    #[error(transparent)]
    Cycle(#[from] CycleReport),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),
}

impl DagrunError {
    /// Whether this error was raised before any step executed.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            DagrunError::InvalidInitialStatus(_)
                | DagrunError::Cycle(_)
                | DagrunError::Lifecycle(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DagrunError>;
