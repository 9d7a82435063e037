use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a step, as tracked by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Failed,
    Succeeded,
    Canceled,
    Skipped,
}

impl StepStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, StepStatus::Pending)
    }

    /// Whether the step has reached a final status and will not run again.
    pub fn is_terminated(self) -> bool {
        matches!(
            self,
            StepStatus::Failed | StepStatus::Succeeded | StepStatus::Canceled | StepStatus::Skipped
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "Pending",
            StepStatus::Running => "Running",
            StepStatus::Failed => "Failed",
            StepStatus::Succeeded => "Succeeded",
            StepStatus::Canceled => "Canceled",
            StepStatus::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// Read-only view of a step: its display name and current status.
///
/// This is the only capability the error types need from a step. The
/// scheduler owns the step itself and keeps the status up to date.
pub trait StepReader: Send + Sync + 'static {
    /// Stable display name, used verbatim in error messages.
    fn name(&self) -> &str;

    /// Current lifecycle status.
    fn status(&self) -> StepStatus;
}

/// Shared handle to a step, keyed by identity.
///
/// Two `StepRef`s are equal only when they point at the same step, so two
/// distinct steps with the same name stay distinct keys.
#[derive(Clone)]
pub struct StepRef(Arc<dyn StepReader>);

impl StepRef {
    pub fn new(step: Arc<dyn StepReader>) -> Self {
        Self(step)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn status(&self) -> StepStatus {
        self.0.status()
    }

    pub fn handle(&self) -> &Arc<dyn StepReader> {
        &self.0
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl<S: StepReader> From<Arc<S>> for StepRef {
    fn from(step: Arc<S>) -> Self {
        Self(step)
    }
}

impl PartialEq for StepRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for StepRef {}

impl Hash for StepRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRef")
            .field("name", &self.name())
            .field("status", &self.status())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::testing::{step, test_step};
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(StepStatus::Pending.to_string(), "Pending");
        assert_eq!(StepStatus::Succeeded.to_string(), "Succeeded");
        assert_eq!(StepStatus::Canceled.to_string(), "Canceled");
    }

    #[test]
    fn test_status_predicates() {
        assert!(StepStatus::default().is_pending());
        assert!(!StepStatus::Running.is_pending());
        assert!(!StepStatus::Running.is_terminated());
        assert!(!StepStatus::Pending.is_terminated());
        assert!(StepStatus::Failed.is_terminated());
        assert!(StepStatus::Skipped.is_terminated());
    }

    #[test]
    fn test_step_ref_identity() {
        let a = step("fetch", StepStatus::Pending);
        let a2 = a.clone();
        let b = step("fetch", StepStatus::Pending);

        assert_eq!(a, a2);
        assert_ne!(a, b);

        let set: HashSet<StepRef> = [a, a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_step_ref_reads_live_status() {
        let inner = test_step("build", StepStatus::Pending);
        let r = StepRef::from(inner.clone());
        assert_eq!(r.status(), StepStatus::Pending);

        inner.set_status(StepStatus::Running);
        assert_eq!(r.status(), StepStatus::Running);
        assert_eq!(r.to_string(), "build");
        assert_eq!(r.handle().name(), "build");
    }

    #[test]
    fn test_status_serialization() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            status: StepStatus,
        }
        let parsed: Wrapper = toml::from_str(r#"status = "Failed""#).unwrap();
        assert_eq!(parsed.status, StepStatus::Failed);
    }
}
