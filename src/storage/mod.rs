//! Persistence interface consumed by the bracket builder.
//!
//! A backend only deals in tables of JSON rows; the typed record layer
//! ([`Record`], [`to_row`], [`from_row`]) sits on top of it.

mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identity of a persisted record. The nil uuid is the "insert failed" sentinel.
pub type Id = Uuid;

/// A persisted record as the backend sees it.
pub type Row = Map<String, Value>;

/// Tables used by the bracket builder.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Stage,
    Group,
    Round,
    Match,
    MatchGame,
    Participant,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Stage,
        Table::Group,
        Table::Round,
        Table::Match,
        Table::MatchGame,
        Table::Participant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Stage => "stage",
            Table::Group => "group",
            Table::Round => "round",
            Table::Match => "match",
            Table::MatchGame => "match_game",
            Table::Participant => "participant",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-equality filter: a row matches when every listed field is equal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(BTreeMap<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality constraint on `field`.
    pub fn by(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Shorthand for constraints on identity columns (`stage_id`, `parent_id`...).
    pub fn by_id(self, field: &str, id: Id) -> Self {
        self.by(field, id.to_string())
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.0.iter().all(|(k, v)| row.get(k) == Some(v))
    }
}

/// Backend faults, distinct from the sentinel returns of the interface.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage backend unavailable")]
    Unavailable,
}

/// The persistence collaborator.
///
/// `insert` returns the nil id and `insert_many`/`update` return `false`
/// when the backend did not store the row; callers turn those into errors.
#[async_trait]
pub trait Storage: Send + Sync {
    /// All rows of `table` matching `filter` (every row when `None`).
    /// `None` means the table holds nothing at all.
    async fn select(&self, table: Table, filter: Option<&Filter>)
        -> Result<Option<Vec<Row>>, StorageError>;

    async fn select_by_id(&self, table: Table, id: Id) -> Result<Option<Row>, StorageError>;

    async fn select_first(&self, table: Table, filter: &Filter)
        -> Result<Option<Row>, StorageError>;

    async fn insert(&self, table: Table, row: Row) -> Result<Id, StorageError>;

    async fn insert_many(&self, table: Table, rows: Vec<Row>) -> Result<bool, StorageError>;

    async fn update(&self, table: Table, id: Id, row: Row) -> Result<bool, StorageError>;
}

/// A typed record stored in one [`Table`].
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: Table;

    fn id(&self) -> Id;

    fn set_id(&mut self, id: Id);
}

/// Serialize a record into a row, without its `id` column (the backend owns it).
pub fn to_row<T: Record>(record: &T) -> Result<Row, serde_json::Error> {
    match serde_json::to_value(record)? {
        Value::Object(mut row) => {
            row.remove("id");
            Ok(row)
        }
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "{} record did not serialize to an object",
            T::TABLE
        ))),
    }
}

pub fn from_row<T: Record>(row: Row) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_requires_every_field() {
        let row = json!({ "round_id": "r1", "number": 2 });
        let row = row.as_object().cloned().unwrap_or_default();

        assert!(Filter::new().by("round_id", "r1").by("number", 2).matches(&row));
        assert!(!Filter::new().by("round_id", "r1").by("number", 3).matches(&row));
        assert!(!Filter::new().by("missing", 1).matches(&row));
        assert!(Filter::new().matches(&row));
    }

    #[test]
    fn table_names_match_storage_layout() {
        let names: Vec<_> = Table::ALL.iter().map(Table::as_str).collect();
        assert_eq!(
            names,
            ["stage", "group", "round", "match", "match_game", "participant"]
        );
        assert_eq!(serde_json::to_value(Table::MatchGame).ok(), Some(json!("match_game")));
    }
}
