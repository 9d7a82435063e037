use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::error::{BoxError, DagrunError, Result};
use crate::step::StepRef;

/// Terminal errors of every step in a workflow run.
///
/// The scheduler records exactly one entry per terminated step, `None` for a
/// step that finished cleanly. Once the run is over the aggregate is only
/// read, typically behind an `Arc`.
///
/// A run with no failures, including a run with no entries at all, is
/// [`is_nil`](Self::is_nil).
#[derive(Debug, Default)]
pub struct WorkflowError {
    entries: Vec<(StepRef, Option<BoxError>)>,
    index: HashMap<StepRef, usize>,
}

impl WorkflowError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the terminal result of `step`.
    ///
    /// A step can be recorded once. A second write for the same step is
    /// rejected and the first result is kept.
    pub fn record(&mut self, step: impl Into<StepRef>, err: Option<BoxError>) -> Result<()> {
        let step = step.into();
        if self.index.contains_key(&step) {
            warn!(step = %step, "Terminal result already recorded, ignoring");
            return Err(DagrunError::DuplicateResult(step.name().to_string()));
        }
        self.index.insert(step.clone(), self.entries.len());
        self.entries.push((step, err));
        Ok(())
    }

    /// True when no recorded step carries an error.
    pub fn is_nil(&self) -> bool {
        self.entries.iter().all(|(_, err)| err.is_none())
    }

    /// Whether `step` has a recorded result (failed or not).
    pub fn contains(&self, step: &StepRef) -> bool {
        self.index.contains_key(step)
    }

    /// The error recorded for `step`, if it failed.
    pub fn error_of(&self, step: &StepRef) -> Option<&BoxError> {
        self.index
            .get(step)
            .and_then(|&i| self.entries[i].1.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All recorded entries in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&StepRef, Option<&BoxError>)> {
        self.entries.iter().map(|(step, err)| (step, err.as_ref()))
    }

    /// Only the entries that carry an error.
    pub fn failures(&self) -> impl Iterator<Item = (&StepRef, &BoxError)> {
        self.entries
            .iter()
            .filter_map(|(step, err)| err.as_ref().map(|e| (step, e)))
    }

    /// `Ok(())` for a clean run, otherwise the aggregate itself.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_nil() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (step, err) in self.failures() {
            writeln!(f, "{} [{}]: {}", step, step.status(), err)?;
        }
        Ok(())
    }
}

impl std::error::Error for WorkflowError {}
