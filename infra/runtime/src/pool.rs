use crate::error::PoolError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{trace, warn};

/// Default concurrency per available core.
const TASKS_PER_CORE: usize = 10;
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Sizing and backpressure for a [`BlockingPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Label attached to log events.
    pub name: String,
    /// Tasks allowed to run at the same time.
    pub max_concurrency: usize,
    /// Tasks allowed to wait for a free slot before new work is shed.
    pub queue_capacity: usize,
    /// Upper bound on the wait for a free slot. `None` waits indefinitely.
    pub queue_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "blocking".to_owned(),
            max_concurrency: crate::available_cores() * TASKS_PER_CORE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_timeout: None,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_queue_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.queue_timeout = timeout;
        self
    }

    fn admission_limit(&self) -> usize {
        self.max_concurrency.saturating_add(self.queue_capacity)
    }
}

/// Point-in-time counters of a [`BlockingPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub max_concurrency: usize,
    pub queue_capacity: usize,
    pub in_flight: usize,
    pub queued: usize,
    pub completed: u64,
    pub rejected: u64,
}

/// Bounded elastic pool for blocking work.
///
/// Tasks run on Tokio's blocking threads, which grow on demand and are reaped when idle. The
/// pool adds the bounds Tokio lacks: at most `max_concurrency` tasks execute at once, at most
/// `queue_capacity` more wait for a slot, and anything beyond that is refused with
/// [`PoolError::Saturated`] without being queued.
///
/// A started task always runs to completion. Dropping the future returned by
/// [`spawn`](Self::spawn) only detaches the caller; the slot is released when the closure
/// returns.
#[strata_derive::handle]
pub struct BlockingPool {
    config: PoolConfig,
    permits: Arc<Semaphore>,
    admitted: AtomicUsize,
    completed: AtomicU64,
    rejected: AtomicU64,
}

impl BlockingPool {
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let max_concurrency = config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let config = PoolConfig { max_concurrency, ..config };

        Self::from_inner(BlockingPoolInner {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            config,
            admitted: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Runs `task` on a blocking thread and resolves with its return value.
    ///
    /// # Errors
    ///
    /// * [`PoolError::Saturated`] when both the running set and the queue are full.
    /// * [`PoolError::Timeout`] when `queue_timeout` elapses before a slot frees up.
    /// * [`PoolError::Closed`] after [`close`](Self::close).
    /// * [`PoolError::Join`] when the task panics.
    pub async fn spawn<F, T>(&self, task: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.permits.is_closed() {
            return Err(PoolError::Closed { context: None });
        }

        let admission = self.admit()?;
        let permit = self.acquire().await?;
        trace!(pool = %self.config.name, "Dispatching blocking task");

        let handle = tokio::task::spawn_blocking(move || {
            let output = task();
            admission.finish(permit);
            output
        });

        handle.await.map_err(|source| {
            if source.is_panic() {
                warn!(pool = %self.config.name, "Blocking task panicked");
            }
            PoolError::Join { source, context: None }
        })
    }

    /// Stops admitting work. Tasks already running finish normally, waiting ones fail with
    /// [`PoolError::Closed`].
    pub fn close(&self) {
        if !self.permits.is_closed() {
            self.permits.close();
            trace!(pool = %self.config.name, "Blocking pool closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let admitted = self.admitted.load(Ordering::Acquire);
        let in_flight =
            self.config.max_concurrency.saturating_sub(self.permits.available_permits());
        PoolStats {
            max_concurrency: self.config.max_concurrency,
            queue_capacity: self.config.queue_capacity,
            in_flight,
            queued: admitted.saturating_sub(in_flight),
            completed: self.completed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    fn admit(&self) -> Result<Admission, PoolError> {
        let limit = self.config.admission_limit();
        match self.admitted.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            (n < limit).then_some(n + 1)
        }) {
            Ok(_) => Ok(Admission { pool: self.clone(), finished: false }),
            Err(admitted) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(pool = %self.config.name, admitted, "Blocking pool saturated, shedding task");
                Err(PoolError::Saturated { admitted, context: None })
            },
        }
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        let acquire = Arc::clone(&self.permits).acquire_owned();
        let permit = match self.config.queue_timeout {
            Some(waited) => tokio::time::timeout(waited, acquire)
                .await
                .map_err(|_| PoolError::Timeout { waited, context: None })?,
            None => acquire.await,
        };
        permit.map_err(|_| PoolError::Closed { context: None })
    }
}

/// Holds one admission slot until the task completes or the caller gives up waiting.
struct Admission {
    pool: BlockingPool,
    finished: bool,
}

impl Admission {
    fn finish(mut self, permit: OwnedSemaphorePermit) {
        self.finished = true;
        self.pool.completed.fetch_add(1, Ordering::Relaxed);
        drop(self);
        drop(permit);
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.pool.admitted.fetch_sub(1, Ordering::AcqRel);
        if !self.finished {
            trace!(pool = %self.pool.config.name, "Admission released without completion");
        }
    }
}
