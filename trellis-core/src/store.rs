//! Generic table-backed store.
//!
//! CRUD over one table through an abstract [`TableBackend`]; query
//! execution stays on the backend side, the store only owns the
//! conventions: an id column, column-filtered row mapping, and
//! paginated filtered lookups.

use crate::error::Error;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One table row.
pub type Row = Map<String, Value>;

/// Pagination window for filtered lookups.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub start: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            start: 0,
            limit: 200,
        }
    }
}

/// A page of results with the unpaginated total.
#[derive(Clone, Debug)]
pub struct PageResult {
    pub total: usize,
    pub results: Vec<Row>,
}

/// Storage boundary: the store never executes queries itself.
pub trait TableBackend: Send + Sync {
    /// Rows matching every filter key exactly, in insertion order.
    fn select(&self, table: &str, filters: &Row) -> Result<Vec<Row>, Error>;
    /// Insert a row, returning the generated id.
    fn insert(&self, table: &str, row: Row) -> Result<i64, Error>;
    /// Update the row whose `id_column` equals `id`.
    fn update(&self, table: &str, id_column: &str, id: i64, row: Row) -> Result<(), Error>;
    /// Delete by id; false when nothing matched.
    fn delete(&self, table: &str, id_column: &str, id: i64) -> Result<bool, Error>;
    /// Column names of the table.
    fn columns(&self, table: &str) -> Result<Vec<String>, Error>;
}

/// Generic CRUD over one table.
pub struct TableStore {
    backend: Arc<dyn TableBackend>,
    table: String,
    id_column: String,
}

impl TableStore {
    pub fn new(backend: Arc<dyn TableBackend>, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
            id_column: "id".to_string(),
        }
    }

    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Find a record by its id.
    pub fn find(&self, id: i64) -> Result<Option<Row>, Error> {
        let mut filters = Row::new();
        filters.insert(self.id_column.clone(), json!(id));
        Ok(self.backend.select(&self.table, &filters)?.into_iter().next())
    }

    /// First record matching a set of filters.
    pub fn find_one_by(&self, filters: &Row) -> Result<Option<Row>, Error> {
        Ok(self.backend.select(&self.table, filters)?.into_iter().next())
    }

    /// Records matching a set of filters, paginated, with the total.
    pub fn find_by(&self, filters: &Row, page: Page) -> Result<PageResult, Error> {
        let all = self.backend.select(&self.table, filters)?;
        let total = all.len();
        let results = all.into_iter().skip(page.start).take(page.limit).collect();
        Ok(PageResult { total, results })
    }

    /// Save a record: insert when the id field is absent or zero,
    /// update otherwise. Returns the record's id.
    pub fn save(&self, data: Row) -> Result<i64, Error> {
        let id = data.get(&self.id_column).and_then(Value::as_i64).unwrap_or(0);
        let mut row = self.from_row(data)?;

        if id == 0 {
            row.remove(&self.id_column);
            self.backend.insert(&self.table, row)
        } else {
            self.backend.update(&self.table, &self.id_column, id, row)?;
            Ok(id)
        }
    }

    /// Delete a record by id; false when nothing matched.
    pub fn remove(&self, id: i64) -> Result<bool, Error> {
        self.backend.delete(&self.table, &self.id_column, id)
    }

    /// Keep only the fields that exist as table columns.
    fn from_row(&self, source: Row) -> Result<Row, Error> {
        let columns = self.backend.columns(&self.table)?;
        Ok(source
            .into_iter()
            .filter(|(key, _)| columns.iter().any(|c| c == key))
            .collect())
    }
}

/// In-memory backend for tests and demos.
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Declare a table and its columns.
    pub fn with_table<I, S>(self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.write().unwrap().insert(
            name.into(),
            MemoryTable {
                columns: columns.into_iter().map(Into::into).collect(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
        self
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(row: &Row, filters: &Row) -> bool {
    filters.iter().all(|(key, value)| row.get(key) == Some(value))
}

impl TableBackend for MemoryBackend {
    fn select(&self, table: &str, filters: &Row) -> Result<Vec<Row>, Error> {
        let tables = self.tables.read().unwrap();
        let table = tables
            .get(table)
            .ok_or_else(|| Error::Store(format!("unknown table: {}", table)))?;
        Ok(table
            .rows
            .iter()
            .filter(|row| matches(row, filters))
            .cloned()
            .collect())
    }

    fn insert(&self, table: &str, mut row: Row) -> Result<i64, Error> {
        let mut tables = self.tables.write().unwrap();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| Error::Store(format!("unknown table: {}", table)))?;
        let id = table.next_id;
        table.next_id += 1;
        row.insert("id".to_string(), json!(id));
        table.rows.push(row);
        Ok(id)
    }

    fn update(&self, table: &str, id_column: &str, id: i64, row: Row) -> Result<(), Error> {
        let mut tables = self.tables.write().unwrap();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| Error::Store(format!("unknown table: {}", table)))?;
        for existing in &mut table.rows {
            if existing.get(id_column).and_then(Value::as_i64) == Some(id) {
                for (key, value) in row {
                    existing.insert(key, value);
                }
                return Ok(());
            }
        }
        Err(Error::Store(format!("no row with {} = {}", id_column, id)))
    }

    fn delete(&self, table: &str, id_column: &str, id: i64) -> Result<bool, Error> {
        let mut tables = self.tables.write().unwrap();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| Error::Store(format!("unknown table: {}", table)))?;
        let before = table.rows.len();
        table
            .rows
            .retain(|row| row.get(id_column).and_then(Value::as_i64) != Some(id));
        Ok(table.rows.len() < before)
    }

    fn columns(&self, table: &str) -> Result<Vec<String>, Error> {
        let tables = self.tables.read().unwrap();
        tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| Error::Store(format!("unknown table: {}", table)))
    }
}
