//! # Database Infrastructure
//!
//! An in-process transactional table store. Rows are JSON documents keyed by a
//! store-assigned [`RowId`], typed through the [`Record`] trait, and only ever live in memory.
//!
//! ## Key Features
//! - **Multi-version snapshots**: every commit publishes a new immutable snapshot; readers
//!   never block writers.
//! - **Isolation levels**: [`IsolationLevel::ReadCommitted`], [`IsolationLevel::RepeatableRead`]
//!   and [`IsolationLevel::Serializable`], validated at commit time.
//! - **Blocking API**: every call is synchronous. Async callers run it on a blocking pool.
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use strata_database::{Database, DatabaseError, Record, TxOptions};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Note {
//!     text: String,
//! }
//!
//! impl Record for Note {
//!     const TABLE: &'static str = "notes";
//! }
//!
//! let db = Database::builder().name("docs").table::<Note>().build()?;
//! let id = db.transaction(TxOptions::repeatable_read(), |tx| {
//!     tx.insert(&Note { text: "hello".to_owned() })
//! })?;
//! let note = db.transaction(TxOptions::read_only(), |tx| tx.fetch_optional::<Note>(id))?;
//! assert_eq!(note.map(|n| n.text).as_deref(), Some("hello"));
//! # Ok::<(), DatabaseError>(())
//! ```

mod error;
mod snapshot;
mod transaction;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use transaction::{AccessMode, IsolationLevel, Transaction, TxOptions};

use fxhash::{FxHashMap, FxHashSet};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snapshot::Snapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::{info, instrument};

/// Store-assigned row identifier. The first row of every table gets `1`.
pub type RowId = i64;

/// A type stored as rows of one table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table name; must be registered with [`DatabaseBuilder::table`].
    const TABLE: &'static str;
}

#[derive(Debug, Default)]
struct Counters {
    commits: AtomicU64,
    rollbacks: AtomicU64,
    conflicts: AtomicU64,
}

/// Point-in-time counters of a [`Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Version of the latest committed snapshot.
    pub version: u64,
    pub commits: u64,
    pub rollbacks: u64,
    /// Commits refused with [`DatabaseError::SerializationFailure`].
    pub conflicts: u64,
    pub rows: usize,
}

/// Thread-safe handle to one store. Clones share the same data.
#[strata_derive::handle]
pub struct Database {
    name: String,
    current: RwLock<Arc<Snapshot>>,
    commit_lock: Mutex<()>,
    sequences: FxHashMap<&'static str, AtomicI64>,
    next_tx: AtomicU64,
    counters: Counters,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens a transaction. Prefer [`transaction`](Self::transaction), which cannot leak one.
    pub fn begin(&self, options: TxOptions) -> Transaction<'_> {
        Transaction::begin(self, options)
    }

    /// Runs `work` inside a transaction, committing on `Ok` and rolling back on `Err`.
    ///
    /// # Errors
    /// Whatever `work` returns, or the commit failure converted into `E`.
    pub fn transaction<T, E, F>(&self, options: TxOptions, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let mut tx = self.begin(options);
        match work(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            },
            Err(err) => {
                tx.rollback();
                Err(err)
            },
        }
    }

    /// Registered table names, sorted.
    #[must_use]
    pub fn tables(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.sequences.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn stats(&self) -> DatabaseStats {
        let latest = self.latest();
        DatabaseStats {
            version: latest.version,
            commits: self.counters.commits.load(Ordering::Relaxed),
            rollbacks: self.counters.rollbacks.load(Ordering::Relaxed),
            conflicts: self.counters.conflicts.load(Ordering::Relaxed),
            rows: latest.tables.values().map(|t| t.rows.len()).sum(),
        }
    }

    fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    fn registered(&self, table: &'static str) -> Result<&'static str, DatabaseError> {
        if self.sequences.contains_key(table) {
            Ok(table)
        } else {
            Err(DatabaseError::UnknownTable { table, context: None })
        }
    }

    fn next_id(&self, table: &'static str) -> Result<RowId, DatabaseError> {
        self.sequences
            .get(table)
            .map(|sequence| sequence.fetch_add(1, Ordering::Relaxed) + 1)
            .ok_or(DatabaseError::UnknownTable { table, context: None })
    }
}

/// A fluent builder for a [`Database`].
///
/// Every record type used later must be registered here; the table set is fixed for the
/// lifetime of the store.
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    name: Option<String>,
    tables: Vec<&'static str>,
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store name used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers the table of record type `R`.
    pub fn table<R: Record>(mut self) -> Self {
        self.tables.push(R::TABLE);
        self
    }

    /// Consumes the builder and creates an empty store.
    ///
    /// # Errors
    /// [`DatabaseError::Validation`] if the name is missing or blank, no table was registered,
    /// or a table was registered twice.
    #[instrument(skip(self), fields(name = ?self.name, tables = ?self.tables))]
    pub fn build(self) -> Result<Database, DatabaseError> {
        let name = self.name.filter(|n| !n.trim().is_empty()).ok_or(DatabaseError::Validation {
            message: "Name is required".into(),
            context: None,
        })?;
        if self.tables.is_empty() {
            return Err(DatabaseError::Validation {
                message: "At least one table is required".into(),
                context: Some(name.into()),
            });
        }

        let mut seen = FxHashSet::default();
        if let Some(duplicate) = self.tables.iter().find(|t| !seen.insert(**t)) {
            return Err(DatabaseError::Validation {
                message: format!("Table '{duplicate}' registered twice").into(),
                context: Some(name.into()),
            });
        }

        let sequences = self.tables.iter().map(|t| (*t, AtomicI64::new(0))).collect();
        let snapshot = Snapshot::with_tables(&self.tables);

        info!(database = %name, tables = self.tables.len(), "In-memory store ready");

        Ok(Database::from_inner(DatabaseInner {
            name,
            current: RwLock::new(Arc::new(snapshot)),
            commit_lock: Mutex::new(()),
            sequences,
            next_tx: AtomicU64::new(0),
            counters: Counters::default(),
        }))
    }
}
