use crate::store::{Query, Row, StoreError, TableStore};
use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Tables visible to a registered remote function
pub type Tables = HashMap<String, Vec<Row>>;

/// Handler backing a remote function in the in-memory store
pub type RpcHandler = Arc<dyn Fn(&mut Tables, Value) -> Result<Value, StoreError> + Send + Sync>;

/// In-process table store with the same query semantics as the hosted one.
///
/// Inserted rows receive an `id` and a `created_at` when they lack them.
/// Timestamps are strictly increasing so newest-first ordering is stable.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    functions: RwLock<HashMap<String, RpcHandler>>,
    failing: RwLock<HashSet<String>>,
    clock: AtomicI64,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            functions: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            clock: AtomicI64::new(0),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Register the handler for a remote function
    pub async fn register_function<F>(&self, name: &str, handler: F)
    where
        F: Fn(&mut Tables, Value) -> Result<Value, StoreError> + Send + Sync + 'static,
    {
        self.functions
            .write()
            .await
            .insert(name.to_string(), Arc::new(handler));
    }

    /// Make every call touching `table` fail with a remote error
    pub async fn fail_table(&self, table: &str) {
        self.failing.write().await.insert(table.to_string());
    }

    /// Load fixture rows without counting them as writes
    pub async fn seed(&self, table: &str, rows: Vec<Row>) -> Vec<Row> {
        let stamped: Vec<Row> = rows.into_iter().map(|row| self.stamp(row)).collect();
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(stamped.clone());
        stamped
    }

    /// Snapshot of every row currently in `table`
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of select calls served
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of insert, update, delete and rpc calls served
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn stamp(&self, mut row: Row) -> Row {
        row.entry("id".to_string())
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        if !row.contains_key("created_at") {
            let tick = self.clock.fetch_add(1, Ordering::SeqCst);
            let created_at = Utc::now() + Duration::microseconds(tick);
            row.insert(
                "created_at".to_string(),
                Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }
        row
    }

    async fn check_available(&self, table: &str) -> Result<(), StoreError> {
        if self.failing.read().await.contains(table) {
            return Err(StoreError::Remote {
                status: 503,
                code: None,
                message: format!("table {} is unavailable", table),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available(table).await?;
        Ok(query.apply(self.rows(table).await))
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available(table).await?;

        let stamped: Vec<Row> = rows.into_iter().map(|row| self.stamp(row)).collect();
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(stamped.clone());
        Ok(stamped)
    }

    async fn update(&self, table: &str, patch: Row, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available(table).await?;

        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<usize, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available(table).await?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        Ok(before - rows.len())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let handler = self
            .functions
            .read()
            .await
            .get(function)
            .cloned()
            .ok_or_else(|| StoreError::UnknownFunction(function.to_string()))?;

        let mut tables = self.tables.write().await;
        handler(&mut tables, args)
    }
}
