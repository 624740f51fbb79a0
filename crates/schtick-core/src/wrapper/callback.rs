use std::{fmt, future::Future, pin::Pin, sync::Arc};

use schtick_model::Task;
use thiserror::Error;
use time::OffsetDateTime;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("callback failed: {reason}")]
    Fail { reason: String },
}

impl CallbackError {
    pub fn fail(reason: impl fmt::Display) -> Self {
        CallbackError::Fail {
            reason: reason.to_string(),
        }
    }
}

pub type CallbackResult = Result<(), CallbackError>;

type ImmediateFn = dyn Fn(&Task, OffsetDateTime) -> CallbackResult + Send + Sync;
type DeferredFn = dyn Fn(Task, OffsetDateTime) -> BoxFuture<CallbackResult> + Send + Sync;

/// User work to run once this node owns an occurrence.
///
/// Either returns immediately or hands back a future; the wrapper awaits both
/// the same way.
#[derive(Clone)]
pub enum Callback {
    Immediate(Arc<ImmediateFn>),
    Deferred(Arc<DeferredFn>),
}

impl Callback {
    pub fn immediate<F>(f: F) -> Self
    where
        F: Fn(&Task, OffsetDateTime) -> CallbackResult + Send + Sync + 'static,
    {
        Callback::Immediate(Arc::new(f))
    }

    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(Task, OffsetDateTime) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        Callback::Deferred(Arc::new(
            move |task: Task, at: OffsetDateTime| -> BoxFuture<CallbackResult> {
                Box::pin(f(task, at))
            },
        ))
    }

    pub async fn invoke(&self, task: &Task, scheduled: OffsetDateTime) -> CallbackResult {
        match self {
            Callback::Immediate(f) => f(task, scheduled),
            Callback::Deferred(f) => f(task.clone(), scheduled).await,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Immediate(_) => f.write_str("Callback::Immediate"),
            Callback::Deferred(_) => f.write_str("Callback::Deferred"),
        }
    }
}

/// Local, store-free check evaluated before any claim is attempted.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Task, OffsetDateTime) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Task, OffsetDateTime) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn allows(&self, task: &Task, scheduled: OffsetDateTime) -> bool {
        (self.0)(task, scheduled)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}
