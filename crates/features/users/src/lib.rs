//! User feature slice.
//!
//! Two layers: [`UserRepository`] is the blocking data access that runs inside a caller's
//! transaction, and [`UserService`] is the async front door that validates input, applies
//! [`UserPolicy`] and ships every transaction to a [`strata_runtime::BlockingPool`].
//!
//! ```rust,no_run
//! use strata_database::Database;
//! use strata_domain::NewUser;
//! use strata_runtime::{BlockingPool, PoolConfig};
//! use strata_users::{UserService, register_tables};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let database = register_tables(Database::builder().name("demo")).build()?;
//! let service = UserService::builder()
//!     .database(database)
//!     .pool(BlockingPool::new(PoolConfig::default()))
//!     .build()?;
//!
//! let user = service.create_user(NewUser::new("Al", "al@x.com")).await?;
//! assert!(user.is_active);
//! # Ok(())
//! # }
//! ```

mod error;
mod notify;
mod policy;
mod repository;
mod service;

pub use error::{UserError, UserErrorExt};
pub use notify::{LogNotifier, NotifyError, NotifyErrorExt, NotifyFuture, Notifier};
pub use policy::UserPolicy;
pub use repository::{RepositoryError, RepositoryErrorExt, UserRepository, register_tables};
pub use service::{UserService, UserServiceBuilder, UserServiceInner};
