use std::borrow::Cow;
use strata_database::DatabaseError;
use strata_users::UserError;

#[strata_derive::strata_error]
pub enum PlatformError {
    #[error("Store initialization failed{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("User service initialization failed{}: {source}", format_context(.context))]
    Users { source: UserError, context: Option<Cow<'static, str>> },

    #[error("Internal platform error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
