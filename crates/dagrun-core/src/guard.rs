//! Panic boundary around step logic.
//!
//! A step that panics must not take the engine down with it. [`PanicGuard`]
//! runs the step, catches any unwind on the calling thread (or inside the
//! polled future), and turns it into an ordinary error. Payloads the caller
//! knows about can be mapped to richer errors with extractors; anything else
//! becomes a [`PanicError`] carrying the payload text.
//!
//! Builds with `panic = "abort"` never unwind, so nothing is intercepted there.

use std::any::Any;
use std::error::Error as StdError;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::error::{BoxError, DagrunError};
use crate::flow::FlowError;
use crate::lifecycle::LifecycleError;
use crate::precondition::{CycleReport, InvalidInitialStatus};
use crate::workflow::WorkflowError;

/// Maps a panic payload to an error, or `None` if it does not recognise it.
pub type Extractor = Box<dyn Fn(&(dyn Any + Send)) -> Option<BoxError> + Send + Sync>;

/// A panic that no extractor recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Runs step logic and converts panics into errors.
pub struct PanicGuard {
    extractors: Vec<Extractor>,
    log_panics: bool,
    opaque_payload_message: String,
}

impl Default for PanicGuard {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}

impl std::fmt::Debug for PanicGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicGuard")
            .field("extractors", &self.extractors.len())
            .field("log_panics", &self.log_panics)
            .field("opaque_payload_message", &self.opaque_payload_message)
            .finish()
    }
}

impl PanicGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            extractors: vec![],
            log_panics: config.log_panics,
            opaque_payload_message: config.opaque_payload_message.clone(),
        }
    }

    /// Append a raw extractor. Extractors are tried in the order they were added.
    pub fn with_extractor<F>(mut self, extract: F) -> Self
    where
        F: Fn(&(dyn Any + Send)) -> Option<BoxError> + Send + Sync + 'static,
    {
        self.extractors.push(Box::new(extract));
        self
    }

    /// Append an extractor for payloads of type `P`.
    pub fn extract<P, F>(self, convert: F) -> Self
    where
        P: Any,
        F: Fn(&P) -> Option<BoxError> + Send + Sync + 'static,
    {
        self.with_extractor(move |payload: &(dyn Any + Send)| {
            payload.downcast_ref::<P>().and_then(|p| convert(p))
        })
    }

    pub fn extractor_count(&self) -> usize {
        self.extractors.len()
    }

    /// Run `op`, returning its result, or the converted panic if it panicked.
    pub fn run<T, F>(&self, op: F) -> std::result::Result<T, BoxError>
    where
        F: FnOnce() -> std::result::Result<T, BoxError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(result) => result,
            Err(payload) => Err(self.convert(payload.as_ref())),
        }
    }

    /// Async counterpart of [`run`](Self::run). Panics raised while polling
    /// `fut` are converted; panics in tasks it spawns are not.
    pub async fn run_future<T, Fut>(&self, fut: Fut) -> std::result::Result<T, BoxError>
    where
        Fut: Future<Output = std::result::Result<T, BoxError>>,
    {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(self.convert(payload.as_ref())),
        }
    }

    fn convert(&self, payload: &(dyn Any + Send)) -> BoxError {
        for (idx, extract) in self.extractors.iter().enumerate() {
            if let Some(err) = extract(payload) {
                if self.log_panics {
                    warn!(panic = %err, extracted = idx, "Intercepted panic in step");
                } else {
                    debug!(panic = %err, extracted = idx, "Intercepted panic in step");
                }
                return err;
            }
        }

        let message =
            payload_text(payload).unwrap_or_else(|| self.opaque_payload_message.clone());
        if self.log_panics {
            warn!(panic = %message, "Intercepted panic in step");
        } else {
            debug!(panic = %message, "Intercepted panic in step");
        }
        Box::new(PanicError { message })
    }
}

/// Text of a panic payload: the message of `panic!`, or the display of an
/// error raised with `panic_any`.
pub fn payload_text(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return Some((*s).to_string());
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return Some(s.clone());
    }
    payload_error(payload).map(|e| e.to_string())
}

fn payload_error(payload: &(dyn Any + Send)) -> Option<&(dyn StdError + 'static)> {
    if let Some(e) = payload.downcast_ref::<BoxError>() {
        return Some(&**e);
    }
    if let Some(e) = payload.downcast_ref::<Box<dyn StdError + Send>>() {
        return Some(&**e);
    }
    downcast_error::<DagrunError>(payload)
        .or_else(|| downcast_error::<PanicError>(payload))
        .or_else(|| downcast_error::<FlowError>(payload))
        .or_else(|| downcast_error::<WorkflowError>(payload))
        .or_else(|| downcast_error::<LifecycleError>(payload))
        .or_else(|| downcast_error::<InvalidInitialStatus>(payload))
        .or_else(|| downcast_error::<CycleReport>(payload))
        .or_else(|| downcast_error::<std::io::Error>(payload))
}

fn downcast_error<E>(payload: &(dyn Any + Send)) -> Option<&(dyn StdError + 'static)>
where
    E: StdError + 'static,
{
    payload
        .downcast_ref::<E>()
        .map(|e| e as &(dyn StdError + 'static))
}

/// Run `op` under a guard with the given extractors and default settings.
pub fn catch_panic_as_error<T, F>(
    op: F,
    extractors: Vec<Extractor>,
) -> std::result::Result<T, BoxError>
where
    F: FnOnce() -> std::result::Result<T, BoxError>,
{
    let guard = PanicGuard {
        extractors,
        ..PanicGuard::default()
    };
    guard.run(op)
}
