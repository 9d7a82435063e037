use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::DagrunError;

/// Misuse of a workflow instance's run lifecycle.
///
/// Compare by variant, never by message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Workflow is running, please wait for it to terminate")]
    WorkflowIsRunning,

    #[error("Workflow has run, inspect its result or reset it before running again")]
    WorkflowHasRun,
}

impl LifecycleError {
    /// Find a lifecycle error in `err`, looking through `DagrunError`.
    pub fn find(err: &(dyn std::error::Error + 'static)) -> Option<Self> {
        if let Some(e) = err.downcast_ref::<LifecycleError>() {
            return Some(*e);
        }
        match err.downcast_ref::<DagrunError>() {
            Some(DagrunError::Lifecycle(e)) => Some(*e),
            _ => None,
        }
    }
}

pub fn is_workflow_running(err: &(dyn std::error::Error + 'static)) -> bool {
    LifecycleError::find(err) == Some(LifecycleError::WorkflowIsRunning)
}

pub fn is_workflow_has_run(err: &(dyn std::error::Error + 'static)) -> bool {
    LifecycleError::find(err) == Some(LifecycleError::WorkflowHasRun)
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;

/// Where a workflow instance is in its run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Finished,
}

/// Guards a workflow instance against overlapping or repeated runs.
///
/// Idle -> Running on [`try_start`](Self::try_start), Running -> Finished on
/// [`finish`](Self::finish), Finished -> Idle on [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct RunGate {
    state: AtomicU8,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        match self.state.load(Ordering::Acquire) {
            IDLE => RunPhase::Idle,
            RUNNING => RunPhase::Running,
            _ => RunPhase::Finished,
        }
    }

    /// Claim the instance for a new run.
    pub fn try_start(&self) -> std::result::Result<(), LifecycleError> {
        match self
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                debug!("Workflow run started");
                Ok(())
            }
            Err(RUNNING) => {
                warn!("Workflow start refused, a run is in progress");
                Err(LifecycleError::WorkflowIsRunning)
            }
            Err(_) => {
                warn!("Workflow start refused, instance already holds a result");
                Err(LifecycleError::WorkflowHasRun)
            }
        }
    }

    /// Mark the current run as terminated. Returns false if no run was in progress.
    pub fn finish(&self) -> bool {
        let finished = self
            .state
            .compare_exchange(RUNNING, FINISHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if finished {
            debug!("Workflow run finished");
        }
        finished
    }

    /// Return a finished instance to idle so it can run again.
    pub fn reset(&self) -> std::result::Result<(), LifecycleError> {
        match self
            .state
            .compare_exchange(FINISHED, IDLE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                debug!("Workflow reset");
                Ok(())
            }
            Err(IDLE) => Ok(()),
            Err(_) => {
                warn!("Workflow reset refused, a run is in progress");
                Err(LifecycleError::WorkflowIsRunning)
            }
        }
    }
}
