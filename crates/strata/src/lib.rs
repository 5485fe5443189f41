//! Facade crate for Strata.
//!
//! Re-exports the shared and feature crates and wires them into a [`Platform`]. Keep this crate
//! thin: it composes other crates and holds no business logic.
//!
//! ```rust,no_run
//! use strata::Platform;
//! use strata::domain::NewUser;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = Platform::builder().build()?;
//! let user = platform.users().create_user(NewUser::new("Al", "al@x.com")).await?;
//! println!("created {}", user.id);
//! platform.shutdown();
//! # Ok(())
//! # }
//! ```

mod error;

pub use crate::error::{PlatformError, PlatformErrorExt};
pub use strata_database::{Database, DatabaseStats};
pub use strata_domain as domain;
pub use strata_kernel as kernel;
pub use strata_runtime::{BlockingPool, PoolConfig, PoolStats};
pub use strata_users as users;

use std::sync::Arc;
use std::time::Duration;
use strata_domain::config::{AppConfig, PoolSettings};
use strata_kernel::clock::Clock;
use strata_users::{Notifier, UserPolicy, UserService, register_tables};
use tracing::info;

const POOL_NAME: &str = "strata-blocking";

/// A fluent builder for a [`Platform`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct PlatformBuilder {
    config: AppConfig,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl PlatformBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the logging notifier.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replaces the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Creates the store, the blocking pool and every service on top of them.
    ///
    /// # Errors
    /// [`PlatformError::Database`] when the store name is blank.
    pub fn build(self) -> Result<Platform, PlatformError> {
        let config = self.config;

        let database = register_tables(Database::builder().name(config.database.name.as_str()))
            .build()
            .context("Registering user tables")?;
        let pool = BlockingPool::new(pool_config(&config.pool));

        let mut users = UserService::builder()
            .database(database.clone())
            .pool(pool.clone())
            .policy(UserPolicy::from(&config.users))
            .welcome_timeout(Duration::from_millis(config.users.welcome_timeout_ms));
        if let Some(notifier) = self.notifier {
            users = users.notifier(notifier);
        }
        if let Some(clock) = self.clock {
            users = users.clock(clock);
        }
        let users = users.build()?;

        let pool_config = pool.config();
        info!(
            database = %database.name(),
            max_concurrency = pool_config.max_concurrency,
            queue_capacity = pool_config.queue_capacity,
            "Platform ready"
        );

        Ok(Platform { config, database, pool, users })
    }
}

fn pool_config(settings: &PoolSettings) -> PoolConfig {
    let mut config = PoolConfig::default()
        .with_name(POOL_NAME)
        .with_queue_timeout(settings.queue_timeout_ms.map(Duration::from_millis));
    if let Some(max) = settings.max_concurrency {
        config = config.with_max_concurrency(max);
    }
    if let Some(capacity) = settings.queue_capacity {
        config = config.with_queue_capacity(capacity);
    }
    config
}

/// Point-in-time counters of a running [`Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStats {
    pub database: DatabaseStats,
    pub pool: PoolStats,
}

/// Everything a front end needs, assembled from one [`AppConfig`]. Clones share state.
#[derive(Debug, Clone)]
pub struct Platform {
    config: AppConfig,
    database: Database,
    pool: BlockingPool,
    users: UserService,
}

impl Platform {
    /// Creates a new [`PlatformBuilder`].
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::default()
    }

    #[must_use]
    pub const fn users(&self) -> &UserService {
        &self.users
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    #[must_use]
    pub const fn pool(&self) -> &BlockingPool {
        &self.pool
    }

    #[must_use]
    pub fn stats(&self) -> PlatformStats {
        PlatformStats { database: self.database.stats(), pool: self.pool.stats() }
    }

    /// Stops accepting work. Transactions already running still commit or roll back.
    pub fn shutdown(&self) {
        self.pool.close();
        let stats = self.stats();
        info!(
            commits = stats.database.commits,
            rollbacks = stats.database.rollbacks,
            conflicts = stats.database.conflicts,
            completed = stats.pool.completed,
            rejected = stats.pool.rejected,
            "Platform stopped"
        );
    }
}
