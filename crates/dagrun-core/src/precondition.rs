//! Errors that stop a workflow before any step runs.

use std::collections::HashMap;
use std::fmt;

use crate::step::StepRef;

/// Steps that were not `Pending` when the workflow was asked to start.
///
/// Steps are kept in the order they were found.
#[derive(Debug, Clone, Default)]
pub struct InvalidInitialStatus(Vec<StepRef>);

impl InvalidInitialStatus {
    pub fn new(steps: Vec<StepRef>) -> Self {
        Self(steps)
    }

    /// Check that every step is `Pending`, collecting those that are not.
    pub fn check<I, S>(steps: I) -> std::result::Result<(), Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<StepRef>,
    {
        let offending: Vec<StepRef> = steps
            .into_iter()
            .map(Into::into)
            .filter(|step| !step.status().is_pending())
            .collect();
        if offending.is_empty() {
            Ok(())
        } else {
            Err(Self(offending))
        }
    }

    pub fn steps(&self) -> &[StepRef] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for InvalidInitialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unexpected step initial status:")?;
        for step in &self.0 {
            write!(f, "\n{} [{}]", step, step.status())?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidInitialStatus {}

/// Steps taking part in a dependency cycle, each with its full dependency list.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    entries: Vec<(StepRef, Vec<StepRef>)>,
    index: HashMap<StepRef, usize>,
}

impl CycleReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `step` with its dependencies, replacing any earlier list for it.
    pub fn insert<I, S>(&mut self, step: impl Into<StepRef>, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<StepRef>,
    {
        let step = step.into();
        let deps: Vec<StepRef> = deps.into_iter().map(Into::into).collect();
        match self.index.get(&step) {
            Some(&i) => self.entries[i].1 = deps,
            None => {
                self.index.insert(step.clone(), self.entries.len());
                self.entries.push((step, deps));
            }
        }
    }

    pub fn deps_of(&self, step: &StepRef) -> Option<&[StepRef]> {
        self.index
            .get(step)
            .map(|&i| self.entries[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StepRef, &[StepRef])> {
        self.entries.iter().map(|(s, deps)| (s, deps.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(StepRef, Vec<StepRef>)> for CycleReport {
    fn from_iter<T: IntoIterator<Item = (StepRef, Vec<StepRef>)>>(iter: T) -> Self {
        let mut report = Self::new();
        for (step, deps) in iter {
            report.insert(step, deps);
        }
        report
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cycle dependency detected:")?;
        for (step, deps) in &self.entries {
            let names: Vec<&str> = deps.iter().map(StepRef::name).collect();
            write!(f, "\n{}: [{}]", step, names.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleReport {}
