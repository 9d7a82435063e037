use thiserror::Error;

use crate::error::BoxError;
use crate::step::StepRef;

/// A failure raised while passing one step's output into another step's input.
///
/// `origin` is the upstream step whose output was being consumed. Its status
/// is read when the error is rendered, not when it is built.
#[derive(Debug, Error)]
#[error("ErrFlow(From {origin} [{status}]): {err}", status = .origin.status())]
pub struct FlowError {
    #[source]
    err: BoxError,
    origin: StepRef,
}

impl FlowError {
    pub fn new(err: impl Into<BoxError>, origin: impl Into<StepRef>) -> Self {
        Self {
            err: err.into(),
            origin: origin.into(),
        }
    }

    /// The underlying error, unchanged.
    pub fn err(&self) -> &BoxError {
        &self.err
    }

    pub fn origin(&self) -> &StepRef {
        &self.origin
    }

    pub fn into_inner(self) -> (BoxError, StepRef) {
        (self.err, self.origin)
    }
}
