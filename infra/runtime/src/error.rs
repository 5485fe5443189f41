use std::borrow::Cow;
use std::time::Duration;
use strata_derive::strata_error;
use tokio::task::JoinError;

#[strata_error]
pub enum PoolError {
    #[error("Worker pool saturated{}: {admitted} tasks already admitted", format_context(.context))]
    Saturated { admitted: usize, context: Option<Cow<'static, str>> },

    #[error("Timed out after {waited:?} waiting for a worker{}", format_context(.context))]
    Timeout { waited: Duration, context: Option<Cow<'static, str>> },

    #[error("Worker pool is closed{}", format_context(.context))]
    Closed { context: Option<Cow<'static, str>> },

    #[error("Blocking task failed{}: {source}", format_context(.context))]
    Join { source: JoinError, context: Option<Cow<'static, str>> },

    #[error("Internal pool error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl PoolError {
    /// `true` when the pool refused work because of load and a later attempt may succeed.
    #[must_use]
    pub const fn is_backpressure(&self) -> bool {
        matches!(self, Self::Saturated { .. } | Self::Timeout { .. })
    }

    /// `true` when the task itself panicked on the worker thread.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Join { source, .. } if source.is_panic())
    }
}
