use crate::RowId;
use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[strata_derive::strata_error]
pub enum DatabaseError {
    /// Builder or argument validation failed.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The record type's table was never registered with the builder.
    #[error("Unknown table '{table}'{}", format_context(.context))]
    UnknownTable { table: &'static str, context: Option<Cow<'static, str>> },

    /// An update addressed a row that does not exist.
    #[error("Row {id} not found in '{table}'{}", format_context(.context))]
    RowNotFound { table: &'static str, id: RowId, context: Option<Cow<'static, str>> },

    /// A write was attempted inside a read-only transaction.
    #[error("Write rejected in read-only transaction on '{table}'{}", format_context(.context))]
    ReadOnlyTransaction { table: &'static str, context: Option<Cow<'static, str>> },

    /// A concurrent commit invalidated this transaction; the caller may retry it.
    #[error("Could not serialize access to '{table}'{}: {message}", format_context(.context))]
    SerializationFailure {
        table: &'static str,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// A row failed to encode or decode.
    #[error("Row codec error{}: {source}", format_context(.context))]
    Codec { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DatabaseError {
    #[must_use]
    pub const fn is_serialization_failure(&self) -> bool {
        matches!(self, Self::SerializationFailure { .. })
    }

    #[must_use]
    pub const fn is_row_not_found(&self) -> bool {
        matches!(self, Self::RowNotFound { .. })
    }
}
