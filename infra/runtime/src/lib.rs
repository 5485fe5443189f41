//! # Runtime
//!
//! Standardized [Tokio](https://tokio.rs) runtime profiles and the bounded pool that carries
//! blocking store work off the async executor.
//!
//! ## Profiles
//! * **Default**: Worker count from `TOKIO_WORKER_THREADS` or the available parallelism.
//! * **High Performance**: Larger stacks, longer keep-alive and a wide blocking budget.
//! * **Memory Efficient**: Half the workers and a narrow blocking budget.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[strata_runtime::main(default)]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = strata_runtime::BlockingPool::new(strata_runtime::PoolConfig::default());
//!     let answer = pool.spawn(|| 40 + 2).await?;
//!     assert_eq!(answer, 42);
//!     Ok(())
//! }
//! ```

mod error;
mod pool;

pub use anyhow::Result;
pub use error::{PoolError, PoolErrorExt};
pub use pool::{BlockingPool, BlockingPoolInner, PoolConfig, PoolStats};
pub use strata_derive::main;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (3 `MiB`).
const DEFAULT_STACK_SIZE: usize = 3 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
/// How long an idle thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);
/// Tokio's own default ceiling for blocking threads.
const DEFAULT_MAX_BLOCKING_THREADS: usize = 512;
const MAX_BLOCKING_THREADS: usize = 4096;

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

/// Detects the optimal number of worker threads based on environment variables or hardware.
fn get_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= 1024)
            .unwrap_or_else(available_cores)
    })
}

pub(crate) fn available_cores() -> usize {
    available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
}

fn validate_stack_size(stack_size: usize) -> usize {
    stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE)
}

fn normalize_config(config: &RuntimeConfig) -> RuntimeConfig {
    let thread_name = if config.thread_name.trim().is_empty() {
        "strata-worker".to_owned()
    } else {
        config.thread_name.clone()
    };

    RuntimeConfig {
        worker_threads: config.worker_threads.clamp(1, 1024),
        max_blocking_threads: config.max_blocking_threads.clamp(1, MAX_BLOCKING_THREADS),
        stack_size: validate_stack_size(config.stack_size),
        thread_name,
        thread_keep_alive: config.thread_keep_alive,
    }
}

/// Configuration for the Tokio runtime.
///
/// `max_blocking_threads` caps the elastic thread set behind `spawn_blocking`, which is where
/// [`BlockingPool`] runs its tasks. Idle blocking threads are reaped after
/// `thread_keep_alive`.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: get_worker_threads(),
            max_blocking_threads: DEFAULT_MAX_BLOCKING_THREADS,
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "strata-worker".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Preset for high-throughput services.
    #[must_use = "Use this configuration for high-throughput services"]
    pub fn high_performance() -> Self {
        Self {
            worker_threads: get_worker_threads(),
            max_blocking_threads: 1024,
            stack_size: 4 * 1024 * 1024,
            thread_name: "strata-hp".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
        }
    }

    /// Preset for tools and constrained hosts where memory footprint matters.
    #[must_use = "Use this configuration where memory footprint matters"]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (get_worker_threads() / 2).max(1),
            max_blocking_threads: 64,
            stack_size: 2 * 1024 * 1024,
            thread_name: "strata-mem".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, 1024);
        self
    }

    #[must_use = "Customize the ceiling of the blocking thread set"]
    pub fn with_max_blocking_threads(mut self, threads: usize) -> Self {
        self.max_blocking_threads = threads.clamp(1, MAX_BLOCKING_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = validate_stack_size(size);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { "strata-worker".to_owned() } else { name };
        self
    }

    #[must_use = "Customize how long idle threads stay alive"]
    pub const fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }
}

/// Creates a multithreaded Tokio runtime from a [`RuntimeConfig`].
///
/// Out-of-range values are clamped before the runtime is built, and all drivers
/// (I/O, time) are enabled.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
///
/// # Examples
///
/// ```rust,ignore
/// use strata_runtime::{build_runtime_with_config, RuntimeConfig};
///
/// let config = RuntimeConfig::memory_efficient().with_max_blocking_threads(16);
/// let runtime = build_runtime_with_config(&config)?;
/// runtime.block_on(async { /* ... */ });
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = normalize_config(config);
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = Builder::new_multi_thread();
    builder
        .worker_threads(config.worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive);

    builder.enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}
