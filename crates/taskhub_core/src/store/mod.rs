//! Remote record store contract.
//!
//! # Responsibility
//! - Describe the generic CRUD surface the coordinator writes through.
//! - Keep transport and schema details behind one async trait.
//!
//! # Invariants
//! - Records are JSON objects keyed by snake_case column names.
//! - The store assigns `id` and `created_at` on insert.
//! - Deleting a category or goal nulls dependent task references.
//! - Task reads and inserts carry `category` and `goal` joins.

pub mod sqlite;

pub use sqlite::SqliteRecordStore;

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::EntityId;

pub type StoreResult<T> = Result<T, StoreError>;

/// Named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Categories,
    Goals,
    Tasks,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Self::Categories, Self::Goals, Self::Tasks];

    pub fn name(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Goals => "goals",
            Self::Tasks => "tasks",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Conjunction of field equality constraints. Empty matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    clauses: Vec<(String, Value)>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: EntityId) -> Self {
        Self::all().eq("id", id.to_string())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Failures reported by a record store.
#[derive(Debug)]
pub enum StoreError {
    /// The store could not be reached or the call did not complete.
    Transport(String),
    /// The store refused the write (constraint or permission).
    Rejected(String),
    /// No record with this id exists remotely.
    NotFound { collection: Collection, id: EntityId },
    /// The record sent or received does not fit the collection.
    InvalidRecord(String),
    /// The local database was written by a newer build.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    Sqlite(rusqlite::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "store transport failure: {message}"),
            Self::Rejected(message) => write!(f, "store rejected write: {message}"),
            Self::NotFound { collection, id } => {
                write!(f, "{collection} record not found: {id}")
            }
            Self::InvalidRecord(message) => write!(f, "invalid record: {message}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Rejected(message.unwrap_or_else(|| code.to_string()))
            }
            other => Self::Sqlite(other),
        }
    }
}

/// Generic CRUD over named collections.
///
/// All calls may fail; callers treat every failure the same way.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns matching records in the store's natural order.
    async fn select(&self, collection: Collection, filter: &RecordFilter)
        -> StoreResult<Vec<Value>>;

    /// Creates a record and returns it as stored.
    async fn insert(&self, collection: Collection, record: Value) -> StoreResult<Value>;

    /// Applies a partial update to one record.
    async fn update(&self, collection: Collection, id: EntityId, patch: Value) -> StoreResult<()>;

    /// Deletes one record; dependents are unlinked by the store.
    async fn delete(&self, collection: Collection, id: EntityId) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::{Collection, RecordFilter};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn filter_collects_clauses_in_order() {
        let id = Uuid::new_v4();
        let filter = RecordFilter::by_id(id).eq("status", "active");
        assert_eq!(
            filter.clauses(),
            &[
                ("id".to_string(), json!(id.to_string())),
                ("status".to_string(), json!("active")),
            ]
        );
        assert!(RecordFilter::all().is_empty());
    }

    #[test]
    fn collection_names_are_stable() {
        let names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["categories", "goals", "tasks"]);
    }
}
