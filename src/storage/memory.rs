//! In-memory storage backend (used by the web binary and the tests).

use super::{Filter, Id, Row, Storage, StorageError, Table};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Tables of rows behind an async lock. Identities are random v4 uuids.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

fn has_id(row: &Row, id: Id) -> bool {
    matches!(row.get("id"), Some(Value::String(s)) if s.parse::<Uuid>().ok() == Some(id))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }

    /// Copy of every row in `table`, in insertion order.
    pub async fn dump(&self, table: Table) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn select(
        &self,
        table: Table,
        filter: Option<&Filter>,
    ) -> Result<Option<Vec<Row>>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table).map(|rows| {
            rows.iter()
                .filter(|row| filter.map_or(true, |f| f.matches(row)))
                .cloned()
                .collect()
        }))
    }

    async fn select_by_id(&self, table: Table, id: Id) -> Result<Option<Row>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|row| has_id(row, id)))
            .cloned())
    }

    async fn select_first(
        &self,
        table: Table,
        filter: &Filter,
    ) -> Result<Option<Row>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|row| filter.matches(row)))
            .cloned())
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Id, StorageError> {
        let id = Uuid::new_v4();
        row.insert("id".to_string(), Value::String(id.to_string()));
        self.tables.write().await.entry(table).or_default().push(row);
        Ok(id)
    }

    async fn insert_many(&self, table: Table, rows: Vec<Row>) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let stored = tables.entry(table).or_default();
        for mut row in rows {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            stored.push(row);
        }
        Ok(true)
    }

    async fn update(&self, table: Table, id: Id, mut row: Row) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| has_id(r, id)))
        else {
            return Ok(false);
        };
        row.insert("id".to_string(), Value::String(id.to_string()));
        *existing = row;
        Ok(true)
    }
}
