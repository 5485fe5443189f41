use crate::RowId;
use fxhash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One committed row and the commit that produced it.
#[derive(Debug, Clone)]
pub(crate) struct Versioned {
    pub(crate) version: u64,
    pub(crate) value: Arc<Value>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    pub(crate) rows: BTreeMap<RowId, Versioned>,
    /// Commit that last touched any row of this table.
    pub(crate) modified: u64,
}

/// Immutable view of the whole store as of commit `version`.
///
/// Tables are shared between snapshots until a commit writes to them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    pub(crate) version: u64,
    pub(crate) tables: FxHashMap<&'static str, Arc<Table>>,
}

impl Snapshot {
    pub(crate) fn with_tables(names: &[&'static str]) -> Self {
        let tables = names.iter().map(|name| (*name, Arc::new(Table::default()))).collect();
        Self { version: 0, tables }
    }

    pub(crate) fn row(&self, table: &str, id: RowId) -> Option<&Versioned> {
        self.tables.get(table).and_then(|t| t.rows.get(&id))
    }

    pub(crate) fn table(&self, table: &str) -> Option<&Arc<Table>> {
        self.tables.get(table)
    }

    pub(crate) fn row_version(&self, table: &str, id: RowId) -> Option<u64> {
        self.row(table, id).map(|row| row.version)
    }

    pub(crate) fn table_version(&self, table: &str) -> u64 {
        self.tables.get(table).map_or(0, |t| t.modified)
    }
}
