pub mod config;
pub mod error;
pub mod flow;
pub mod guard;
pub mod lifecycle;
pub mod precondition;
pub mod step;
pub mod workflow;

pub use config::{DagrunConfig, GuardConfig};
pub use error::{BoxError, DagrunError, Result};
pub use flow::FlowError;
pub use guard::{catch_panic_as_error, Extractor, PanicError, PanicGuard};
pub use lifecycle::{is_workflow_has_run, is_workflow_running, LifecycleError, RunGate, RunPhase};
pub use precondition::{CycleReport, InvalidInitialStatus};
pub use step::{StepReader, StepRef, StepStatus};
pub use workflow::WorkflowError;
