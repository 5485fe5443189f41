use std::borrow::Cow;
use strata_database::DatabaseError;
use strata_domain::UserId;
use strata_runtime::PoolError;

/// A specialized [`UserError`] enum of this crate.
///
/// The first three variants are the caller-facing taxonomy: nothing was written when one of
/// them is returned.
#[strata_derive::strata_error]
pub enum UserError {
    /// No user has the requested id.
    #[error("User {id} not found{}", format_context(.context))]
    NotFound { id: UserId, context: Option<Cow<'static, str>> },

    /// Input rejected before touching the store.
    #[error("Invalid {field}{}: {message}", format_context(.context))]
    InvalidInput {
        field: &'static str,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// A business rule refused the change after reading the current state.
    #[error("Operation not permitted{}: {message}", format_context(.context))]
    OperationNotPermitted { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The store failed, including serialization conflicts between concurrent transactions.
    #[error("Store error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// The blocking pool refused or lost the work.
    #[error("Service unavailable{}: {source}", format_context(.context))]
    Unavailable { source: PoolError, context: Option<Cow<'static, str>> },

    /// The service was assembled without a required collaborator.
    #[error("Service configuration error{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal users error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl UserError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput { field, message: message.into(), context: None }
    }

    pub(crate) fn not_permitted(message: impl Into<Cow<'static, str>>) -> Self {
        Self::OperationNotPermitted { message: message.into(), context: None }
    }

    /// `true` when repeating the same call may succeed: a serialization conflict or pool
    /// backpressure. The service itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Database { source, .. } => source.is_serialization_failure(),
            Self::Unavailable { source, .. } => source.is_backpressure(),
            _ => false,
        }
    }
}
