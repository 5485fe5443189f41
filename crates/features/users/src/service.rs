use crate::error::{UserError, UserErrorExt};
use crate::notify::{LogNotifier, Notifier};
use crate::policy::UserPolicy;
use crate::repository::UserRepository;
use std::sync::Arc;
use std::time::Duration;
use strata_database::{Database, TxOptions};
use strata_domain::{NewUser, User, UserId};
use strata_kernel::clock::{Clock, SystemClock};
use strata_runtime::BlockingPool;
use tracing::{debug, info, instrument, warn};

const DEFAULT_WELCOME_TIMEOUT: Duration = Duration::from_secs(5);

/// Async front door for user operations.
///
/// Each call validates what it can up front, then hands exactly one transaction to the blocking
/// pool and awaits it. Nothing is written when a call fails.
#[strata_derive::handle]
pub struct UserService {
    database: Database,
    pool: BlockingPool,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: UserPolicy,
    welcome_timeout: Duration,
}

impl UserService {
    /// Creates a new [`UserServiceBuilder`].
    pub fn builder() -> UserServiceBuilder {
        UserServiceBuilder::default()
    }

    #[must_use]
    pub fn policy(&self) -> UserPolicy {
        self.policy
    }

    /// All users ordered by id.
    ///
    /// # Errors
    /// [`UserError::Database`] or [`UserError::Unavailable`].
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.run("Listing users", TxOptions::read_only(), |repo| Ok(repo.find_all()?)).await
    }

    /// # Errors
    /// [`UserError::NotFound`] when no user has `id`.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User, UserError> {
        self.run("Loading user", TxOptions::read_only(), move |repo| {
            repo.find_by_id(id)?.ok_or(UserError::NotFound { id, context: None })
        })
        .await
    }

    /// Validates and persists a new user, then sends the welcome notification in the
    /// background.
    ///
    /// # Errors
    /// [`UserError::InvalidInput`] before any store access.
    #[instrument(skip(self, new_user), fields(name = %new_user.name, admin = new_user.is_admin))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, UserError> {
        self.policy.validate_new_user(&new_user)?;
        let registered_on = self.clock.today();

        let user = self
            .run("Creating user", TxOptions::repeatable_read(), move |repo| {
                let id = repo.insert(&new_user, registered_on)?;
                Ok(new_user.into_user(id, registered_on))
            })
            .await?;

        info!(user_id = %user.id, "User created");
        self.spawn_welcome(user.clone());
        Ok(user)
    }

    /// Replaces the email of `id` unless the cool-down since the previous change is running.
    ///
    /// The read, the check and the write share one serializable transaction, so a concurrent
    /// change to the same user makes one of them fail with a retryable conflict.
    ///
    /// # Errors
    /// * [`UserError::InvalidInput`] when `email` lacks `@`.
    /// * [`UserError::NotFound`] when no user has `id`.
    /// * [`UserError::OperationNotPermitted`] during the cool-down.
    #[instrument(skip(self, email))]
    pub async fn change_email(
        &self,
        id: UserId,
        email: impl Into<String>,
    ) -> Result<User, UserError> {
        let email = email.into();
        UserPolicy::validate_email(&email)?;
        let today = self.clock.today();
        let policy = self.policy;

        let user = self
            .run("Changing email", TxOptions::serializable(), move |repo| {
                let current =
                    repo.find_by_id(id)?.ok_or(UserError::NotFound { id, context: None })?;
                policy.ensure_email_change_allowed(&current, today)?;

                let updated = current.with_email(email, today);
                repo.update(&updated)?;
                Ok(updated)
            })
            .await?;

        info!(user_id = %id, "Email changed");
        Ok(user)
    }

    /// # Errors
    /// * [`UserError::NotFound`] when no user has `id`.
    /// * [`UserError::OperationNotPermitted`] for administrators and inactive users.
    #[instrument(skip(self))]
    pub async fn deactivate_user(&self, id: UserId) -> Result<User, UserError> {
        let today = self.clock.today();

        let user = self
            .run("Deactivating user", TxOptions::repeatable_read(), move |repo| {
                let current =
                    repo.find_by_id(id)?.ok_or(UserError::NotFound { id, context: None })?;
                UserPolicy::ensure_deactivation_allowed(&current)?;

                let updated = current.deactivated(today);
                repo.update(&updated)?;
                Ok(updated)
            })
            .await?;

        info!(user_id = %id, "User deactivated");
        Ok(user)
    }

    /// Runs `work` in one transaction on the blocking pool. `Ok` commits, `Err` rolls back.
    async fn run<T, F>(&self, op: &'static str, options: TxOptions, work: F) -> Result<T, UserError>
    where
        F: FnOnce(&mut UserRepository<'_, '_>) -> Result<T, UserError> + Send + 'static,
        T: Send + 'static,
    {
        let database = self.database.clone();
        debug!(op, isolation = %options.isolation, "Dispatching transaction");

        let result = self
            .pool
            .spawn(move || {
                database.transaction(options, |tx| work(&mut UserRepository::new(tx)))
            })
            .await
            .context(op)?;

        if let Err(err) = &result {
            debug!(op, kind = err.kind(), error = %err, "Transaction rolled back");
        }
        result
    }

    fn spawn_welcome(&self, user: User) {
        let notifier = Arc::clone(&self.notifier);
        let budget = self.welcome_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(budget, notifier.send_welcome(&user)).await {
                Ok(Ok(())) => debug!(user_id = %user.id, "Welcome notification delivered"),
                Ok(Err(err)) => warn!(user_id = %user.id, error = %err, "Welcome notification failed"),
                Err(_) => warn!(user_id = %user.id, ?budget, "Welcome notification timed out"),
            }
        });
    }
}

/// A fluent builder for a [`UserService`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct UserServiceBuilder {
    database: Option<Database>,
    pool: Option<BlockingPool>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    policy: UserPolicy,
    welcome_timeout: Option<Duration>,
}

impl UserServiceBuilder {
    /// Store holding the `users` table. Required.
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Pool that runs every transaction. Required.
    pub fn pool(mut self, pool: BlockingPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub const fn policy(mut self, policy: UserPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Budget for one welcome notification. Defaults to five seconds.
    pub const fn welcome_timeout(mut self, timeout: Duration) -> Self {
        self.welcome_timeout = Some(timeout);
        self
    }

    /// # Errors
    /// [`UserError::Configuration`] when the database or the pool is missing.
    pub fn build(self) -> Result<UserService, UserError> {
        let database = self.database.ok_or(UserError::Configuration {
            message: "Database is required".into(),
            context: None,
        })?;
        let pool = self.pool.ok_or(UserError::Configuration {
            message: "Blocking pool is required".into(),
            context: None,
        })?;

        Ok(UserService::from_inner(UserServiceInner {
            database,
            pool,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            policy: self.policy,
            welcome_timeout: self.welcome_timeout.unwrap_or(DEFAULT_WELCOME_TIMEOUT),
        }))
    }
}
