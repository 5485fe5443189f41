//! Outbound notifications sent after user lifecycle events.

use std::borrow::Cow;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use strata_domain::User;
use tracing::info;

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

#[strata_derive::strata_error]
pub enum NotifyError {
    #[error("Notification delivery failed{}: {message}", format_context(.context))]
    Delivery { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal notification error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Delivers messages to users. Failures never affect the operation that triggered them.
pub trait Notifier: Debug + Send + Sync + 'static {
    fn send_welcome<'a>(&'a self, user: &'a User) -> NotifyFuture<'a>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_welcome<'a>(&'a self, user: &'a User) -> NotifyFuture<'a> {
        Box::pin(async move {
            info!(user_id = %user.id, email = %user.email, "Welcome notification sent");
            Ok::<_, NotifyError>(())
        })
    }
}
