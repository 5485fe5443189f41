use crate::snapshot::{Snapshot, Versioned};
use crate::{Database, DatabaseError, DatabaseErrorExt, Record, RowId};
use fxhash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

/// How much of other transactions' work a transaction may observe.
///
/// Levels are ordered by strength, so `level >= IsolationLevel::RepeatableRead` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum IsolationLevel {
    /// Every read sees the latest committed state. Concurrent updates: last writer wins.
    #[default]
    ReadCommitted,
    /// Reads see the snapshot taken at begin. Commit fails if a row this transaction updates
    /// was committed by someone else in the meantime.
    RepeatableRead,
    /// Repeatable read plus validation of everything read: commit fails if any row read or
    /// table scanned changed after the snapshot.
    Serializable,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadCommitted => "read committed",
            Self::RepeatableRead => "repeatable read",
            Self::Serializable => "serializable",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    ReadOnly,
    #[default]
    ReadWrite,
}

/// Isolation and access mode of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub access: AccessMode,
}

impl TxOptions {
    #[must_use]
    pub const fn new(isolation: IsolationLevel, access: AccessMode) -> Self {
        Self { isolation, access }
    }

    /// Read committed, writes rejected.
    #[must_use]
    pub const fn read_only() -> Self {
        Self::new(IsolationLevel::ReadCommitted, AccessMode::ReadOnly)
    }

    #[must_use]
    pub const fn repeatable_read() -> Self {
        Self::new(IsolationLevel::RepeatableRead, AccessMode::ReadWrite)
    }

    #[must_use]
    pub const fn serializable() -> Self {
        Self::new(IsolationLevel::Serializable, AccessMode::ReadWrite)
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self.access, AccessMode::ReadOnly)
    }
}

#[derive(Debug)]
enum Pending {
    Insert(Value),
    Update(Value),
}

impl Pending {
    const fn value(&self) -> &Value {
        match self {
            Self::Insert(value) | Self::Update(value) => value,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Insert(value) | Self::Update(value) => value,
        }
    }
}

/// A unit of work against a [`Database`].
///
/// Writes are buffered and become visible to others only on [`commit`](Self::commit). The
/// transaction always sees its own buffered writes. Dropping it without committing rolls it
/// back.
#[derive(Debug)]
pub struct Transaction<'db> {
    db: &'db Database,
    id: u64,
    options: TxOptions,
    snapshot: Arc<Snapshot>,
    writes: FxHashMap<&'static str, BTreeMap<RowId, Pending>>,
    reads: FxHashMap<(&'static str, RowId), Option<u64>>,
    scans: FxHashMap<&'static str, u64>,
    finished: bool,
}

impl<'db> Transaction<'db> {
    pub(crate) fn begin(db: &'db Database, options: TxOptions) -> Self {
        let id = db.next_tx.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = db.latest();
        debug!(
            tx = id,
            isolation = %options.isolation,
            read_only = options.is_read_only(),
            snapshot = snapshot.version,
            "Transaction started"
        );

        Self {
            db,
            id,
            options,
            snapshot,
            writes: FxHashMap::default(),
            reads: FxHashMap::default(),
            scans: FxHashMap::default(),
            finished: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn options(&self) -> TxOptions {
        self.options
    }

    /// Reads one row, or `None` when no row has this id.
    ///
    /// # Errors
    /// [`DatabaseError::UnknownTable`] or [`DatabaseError::Codec`].
    pub fn fetch_optional<R: Record>(&mut self, id: RowId) -> Result<Option<R>, DatabaseError> {
        let table = self.db.registered(R::TABLE)?;
        if let Some(pending) = self.writes.get(table).and_then(|rows| rows.get(&id)) {
            return decode::<R>(pending.value()).map(Some);
        }

        let row = self.visible_row(table, id);
        self.observe_row(table, id, row.as_ref());
        row.map(|row| decode::<R>(&row.value)).transpose()
    }

    /// Reads every row of the record's table, ordered by id.
    ///
    /// # Errors
    /// [`DatabaseError::UnknownTable`] or [`DatabaseError::Codec`].
    pub fn fetch_all<R: Record>(&mut self) -> Result<Vec<(RowId, R)>, DatabaseError> {
        let table = self.db.registered(R::TABLE)?;
        let view = self.view();
        let data =
            view.table(table).ok_or(DatabaseError::UnknownTable { table, context: None })?;
        if self.tracks_reads() {
            self.scans.entry(table).or_insert(data.modified);
        }

        let mut merged: BTreeMap<RowId, &Value> =
            data.rows.iter().map(|(id, row)| (*id, row.value.as_ref())).collect();
        if let Some(pending) = self.writes.get(table) {
            merged.extend(pending.iter().map(|(id, write)| (*id, write.value())));
        }

        merged.into_iter().map(|(id, value)| decode::<R>(value).map(|record| (id, record))).collect()
    }

    /// Buffers a new row and returns its freshly allocated id.
    ///
    /// Ids are never handed out twice, even when this transaction rolls back.
    ///
    /// # Errors
    /// [`DatabaseError::ReadOnlyTransaction`], [`DatabaseError::UnknownTable`] or
    /// [`DatabaseError::Codec`].
    pub fn insert<R: Record>(&mut self, record: &R) -> Result<RowId, DatabaseError> {
        let table = self.writable(R::TABLE)?;
        let value = encode(record)?;
        let id = self.db.next_id(table)?;

        self.writes.entry(table).or_default().insert(id, Pending::Insert(value));
        trace!(tx = self.id, table, id, "Row insert buffered");
        Ok(id)
    }

    /// Buffers a full replacement of row `id`.
    ///
    /// # Errors
    /// [`DatabaseError::RowNotFound`] when no visible row has this id, plus the errors of
    /// [`insert`](Self::insert).
    pub fn update<R: Record>(&mut self, id: RowId, record: &R) -> Result<(), DatabaseError> {
        let table = self.writable(R::TABLE)?;
        let value = encode(record)?;

        let write = match self.writes.get(table).and_then(|rows| rows.get(&id)) {
            Some(Pending::Insert(_)) => Pending::Insert(value),
            Some(Pending::Update(_)) => Pending::Update(value),
            None => {
                let row = self.visible_row(table, id);
                self.observe_row(table, id, row.as_ref());
                if row.is_none() {
                    return Err(DatabaseError::RowNotFound { table, id, context: None });
                }
                Pending::Update(value)
            },
        };

        self.writes.entry(table).or_default().insert(id, write);
        trace!(tx = self.id, table, id, "Row update buffered");
        Ok(())
    }

    /// Validates against concurrent commits and publishes the buffered writes atomically.
    ///
    /// # Errors
    /// [`DatabaseError::SerializationFailure`] when the isolation level detects a conflicting
    /// commit. Nothing is published in that case.
    pub fn commit(mut self) -> Result<(), DatabaseError> {
        self.finished = true;
        let writes = std::mem::take(&mut self.writes);
        if writes.is_empty() {
            self.db.counters.commits.fetch_add(1, Ordering::Relaxed);
            debug!(tx = self.id, "Transaction committed without writes");
            return Ok(());
        }

        let _serial = self.db.commit_lock.lock();
        let current = self.db.latest();
        if let Err(err) = self.validate(&current, &writes) {
            self.db.counters.conflicts.fetch_add(1, Ordering::Relaxed);
            self.db.counters.rollbacks.fetch_add(1, Ordering::Relaxed);
            debug!(tx = self.id, error = %err, "Transaction aborted on commit");
            return Err(err);
        }

        let version = current.version + 1;
        let mut next = Snapshot::clone(&current);
        let mut written = 0_usize;
        for (table, rows) in writes {
            // `current` still shares the table, so this copies its row map once per commit.
            let data = Arc::make_mut(next.tables.entry(table).or_default());
            for (id, pending) in rows {
                data.rows.insert(id, Versioned { version, value: Arc::new(pending.into_value()) });
                written += 1;
            }
            data.modified = version;
        }
        next.version = version;
        *self.db.current.write() = Arc::new(next);

        self.db.counters.commits.fetch_add(1, Ordering::Relaxed);
        debug!(tx = self.id, version, rows = written, "Transaction committed");
        Ok(())
    }

    /// Discards every buffered write.
    pub fn rollback(mut self) {
        self.abandon("Transaction rolled back");
    }

    fn abandon(&mut self, reason: &'static str) {
        if !self.finished {
            self.finished = true;
            self.writes.clear();
            self.db.counters.rollbacks.fetch_add(1, Ordering::Relaxed);
            debug!(tx = self.id, "{reason}");
        }
    }

    fn validate(
        &self,
        current: &Snapshot,
        writes: &FxHashMap<&'static str, BTreeMap<RowId, Pending>>,
    ) -> Result<(), DatabaseError> {
        let since = self.snapshot.version;

        if self.options.isolation >= IsolationLevel::RepeatableRead {
            for (&table, rows) in writes {
                let clobbered = rows.iter().find(|(id, pending)| {
                    matches!(pending, Pending::Update(_))
                        && current.row_version(table, **id).is_some_and(|v| v > since)
                });
                if let Some((id, _)) = clobbered {
                    return Err(conflict(table, format!("row {id} was updated concurrently")));
                }
            }
        }

        if self.options.isolation == IsolationLevel::Serializable {
            for (&(table, id), observed) in &self.reads {
                if current.row_version(table, id) != *observed {
                    return Err(conflict(table, format!("row {id} changed after it was read")));
                }
            }
            for (&table, observed) in &self.scans {
                if current.table_version(table) != *observed {
                    return Err(conflict(table, "table changed after it was scanned".to_owned()));
                }
            }
        }

        Ok(())
    }

    fn writable(&self, table: &'static str) -> Result<&'static str, DatabaseError> {
        let table = self.db.registered(table)?;
        if self.options.is_read_only() {
            return Err(DatabaseError::ReadOnlyTransaction { table, context: None });
        }
        Ok(table)
    }

    fn view(&self) -> Arc<Snapshot> {
        match self.options.isolation {
            IsolationLevel::ReadCommitted => self.db.latest(),
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable => {
                Arc::clone(&self.snapshot)
            },
        }
    }

    fn visible_row(&self, table: &str, id: RowId) -> Option<Versioned> {
        self.view().row(table, id).cloned()
    }

    const fn tracks_reads(&self) -> bool {
        matches!(self.options.isolation, IsolationLevel::Serializable)
    }

    fn observe_row(&mut self, table: &'static str, id: RowId, row: Option<&Versioned>) {
        if self.tracks_reads() {
            self.reads.entry((table, id)).or_insert(row.map(|r| r.version));
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.abandon("Transaction dropped without commit");
    }
}

fn conflict(table: &'static str, message: String) -> DatabaseError {
    DatabaseError::SerializationFailure { table, message: message.into(), context: None }
}

fn encode<R: Record>(record: &R) -> Result<Value, DatabaseError> {
    serde_json::to_value(record).context(format!("Encoding row for '{}'", R::TABLE))
}

fn decode<R: Record>(value: &Value) -> Result<R, DatabaseError> {
    R::deserialize(value).context(format!("Decoding row from '{}'", R::TABLE))
}
