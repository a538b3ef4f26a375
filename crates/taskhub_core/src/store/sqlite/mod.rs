//! SQLite-backed `RecordStore`.
//!
//! # Responsibility
//! - Persist the three collections with the same column names the remote
//!   store uses, so the coordinator cannot tell the two apart.
//! - Assign ids and timestamps the way the hosted store does.
//!
//! # Invariants
//! - Only known columns are read or written; unknown fields are rejected.
//! - `id`, `created_at`, and `updated_at` are store-managed.
//! - Natural order is insertion order (`rowid`).

pub mod migrations;
mod open;

use crate::model::EntityId;
use crate::store::{Collection, RecordFilter, RecordStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Integer,
    Bool,
}

#[derive(Debug, Clone, Copy)]
struct Column {
    name: &'static str,
    kind: ColumnKind,
    writable: bool,
}

const fn managed(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
        writable: false,
    }
}

const fn column(name: &'static str, kind: ColumnKind) -> Column {
    Column {
        name,
        kind,
        writable: true,
    }
}

const CATEGORY_COLUMNS: &[Column] = &[
    managed("id"),
    column("name", ColumnKind::Text),
    column("color_hex", ColumnKind::Text),
    managed("created_at"),
];

const GOAL_COLUMNS: &[Column] = &[
    managed("id"),
    column("name", ColumnKind::Text),
    column("description", ColumnKind::Text),
    column("goal_type", ColumnKind::Text),
    column("due_date", ColumnKind::Text),
    column("status", ColumnKind::Text),
    column("user_order", ColumnKind::Integer),
    managed("created_at"),
    managed("updated_at"),
];

const TASK_COLUMNS: &[Column] = &[
    managed("id"),
    column("title", ColumnKind::Text),
    column("notes", ColumnKind::Text),
    column("category_id", ColumnKind::Text),
    column("goal_id", ColumnKind::Text),
    column("due_date", ColumnKind::Text),
    column("is_completed", ColumnKind::Bool),
    column("completed_at", ColumnKind::Text),
    column("status", ColumnKind::Text),
    column("user_order", ColumnKind::Integer),
    column("is_recurring", ColumnKind::Bool),
    column("recurrence_type", ColumnKind::Text),
    column("recurrence_interval", ColumnKind::Integer),
    column("recurrence_day_of_week", ColumnKind::Integer),
    column("recurrence_ends_on", ColumnKind::Text),
    managed("created_at"),
    managed("updated_at"),
];

fn columns(collection: Collection) -> &'static [Column] {
    match collection {
        Collection::Categories => CATEGORY_COLUMNS,
        Collection::Goals => GOAL_COLUMNS,
        Collection::Tasks => TASK_COLUMNS,
    }
}

fn tracks_updates(collection: Collection) -> bool {
    columns(collection)
        .iter()
        .any(|column| column.name == "updated_at")
}

fn find_column(collection: Collection, name: &str) -> StoreResult<Column> {
    columns(collection)
        .iter()
        .copied()
        .find(|column| column.name == name)
        .ok_or_else(|| {
            StoreError::InvalidRecord(format!("unknown column `{name}` for {collection}"))
        })
}

/// Record store over one SQLite connection.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open::open_file(path.as_ref())?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open::open_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Current schema version of the underlying database.
    pub fn schema_version(&self) -> StoreResult<u32> {
        let conn = self.lock()?;
        migrations::current_user_version(&conn)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Transport("sqlite connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn select(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> StoreResult<Vec<Value>> {
        let started_at = Instant::now();
        let conn = self.lock()?;
        let records = select_records(&conn, collection, filter)?;
        debug!(
            "event=store_select module=store status=ok collection={} rows={} duration_ms={}",
            collection,
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    async fn insert(&self, collection: Collection, record: Value) -> StoreResult<Value> {
        let started_at = Instant::now();
        let Value::Object(fields) = record else {
            return Err(StoreError::InvalidRecord(format!(
                "{collection} insert expects a JSON object"
            )));
        };

        let id = Uuid::new_v4();
        let now = timestamp_now();
        let mut names = vec!["id", "created_at"];
        let mut values = vec![SqlValue::Text(id.to_string()), SqlValue::Text(now.clone())];
        if tracks_updates(collection) {
            names.push("updated_at");
            values.push(SqlValue::Text(now));
        }

        for (key, value) in &fields {
            let column = find_column(collection, key)?;
            if !column.writable {
                continue;
            }
            names.push(column.name);
            values.push(json_to_sql(column, value)?);
        }

        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            collection.name(),
            names.join(", ")
        );

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(values))?;
        let created = select_records(&conn, collection, &RecordFilter::by_id(id))?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound { collection, id })?;

        debug!(
            "event=store_insert module=store status=ok collection={} id={} duration_ms={}",
            collection,
            id,
            started_at.elapsed().as_millis()
        );
        Ok(created)
    }

    async fn update(&self, collection: Collection, id: EntityId, patch: Value) -> StoreResult<()> {
        let started_at = Instant::now();
        let Value::Object(fields) = patch else {
            return Err(StoreError::InvalidRecord(format!(
                "{collection} update expects a JSON object"
            )));
        };

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for (key, value) in &fields {
            let column = find_column(collection, key)?;
            if !column.writable {
                return Err(StoreError::InvalidRecord(format!(
                    "column `{key}` of {collection} is store-managed"
                )));
            }
            assignments.push(format!("{} = ?", column.name));
            values.push(json_to_sql(column, value)?);
        }
        if tracks_updates(collection) {
            assignments.push("updated_at = ?".to_string());
            values.push(SqlValue::Text(timestamp_now()));
        }

        let conn = self.lock()?;
        let changed = if assignments.is_empty() {
            let exists: Option<i64> = conn
                .query_row(
                    &format!("SELECT 1 FROM {} WHERE id = ?1;", collection.name()),
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            usize::from(exists.is_some())
        } else {
            values.push(SqlValue::Text(id.to_string()));
            conn.execute(
                &format!(
                    "UPDATE {} SET {} WHERE id = ?;",
                    collection.name(),
                    assignments.join(", ")
                ),
                params_from_iter(values),
            )?
        };

        if changed == 0 {
            return Err(StoreError::NotFound { collection, id });
        }

        debug!(
            "event=store_update module=store status=ok collection={} id={} fields={} duration_ms={}",
            collection,
            id,
            fields.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: EntityId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", collection.name()),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        debug!(
            "event=store_delete module=store status=ok collection={} id={}",
            collection, id
        );
        Ok(())
    }
}

fn select_records(
    conn: &Connection,
    collection: Collection,
    filter: &RecordFilter,
) -> StoreResult<Vec<Value>> {
    let table_columns = columns(collection);
    let mut sql = format!(
        "SELECT {} FROM {} WHERE 1 = 1",
        table_columns
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", "),
        collection.name()
    );
    let mut values = Vec::new();
    for (field, value) in filter.clauses() {
        let column = find_column(collection, field)?;
        if value.is_null() {
            sql.push_str(&format!(" AND {} IS NULL", column.name));
        } else {
            sql.push_str(&format!(" AND {} = ?", column.name));
            values.push(json_to_sql(column, value)?);
        }
    }
    sql.push_str(" ORDER BY rowid ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = read_row(row, table_columns)?;
        if collection == Collection::Tasks {
            expand_task_joins(conn, &mut record)?;
        }
        records.push(Value::Object(record));
    }
    Ok(records)
}

fn read_row(row: &Row<'_>, table_columns: &[Column]) -> StoreResult<Map<String, Value>> {
    let mut record = Map::new();
    for column in table_columns {
        let value = match column.kind {
            ColumnKind::Text => row
                .get::<_, Option<String>>(column.name)?
                .map_or(Value::Null, Value::String),
            ColumnKind::Integer => row
                .get::<_, Option<i64>>(column.name)?
                .map_or(Value::Null, |number| json!(number)),
            ColumnKind::Bool => row
                .get::<_, Option<i64>>(column.name)?
                .map_or(Value::Null, |flag| Value::Bool(flag != 0)),
        };
        record.insert(column.name.to_string(), value);
    }
    Ok(record)
}

fn expand_task_joins(conn: &Connection, record: &mut Map<String, Value>) -> StoreResult<()> {
    let category = match record.get("category_id").and_then(Value::as_str) {
        Some(category_id) => conn
            .query_row(
                "SELECT id, name, color_hex FROM categories WHERE id = ?1;",
                [category_id],
                |row| {
                    Ok(json!({
                        "id": row.get::<_, String>(0)?,
                        "name": row.get::<_, String>(1)?,
                        "color_hex": row.get::<_, String>(2)?,
                    }))
                },
            )
            .optional()?,
        None => None,
    };
    let goal = match record.get("goal_id").and_then(Value::as_str) {
        Some(goal_id) => conn
            .query_row(
                "SELECT id, name FROM goals WHERE id = ?1;",
                [goal_id],
                |row| {
                    Ok(json!({
                        "id": row.get::<_, String>(0)?,
                        "name": row.get::<_, String>(1)?,
                    }))
                },
            )
            .optional()?,
        None => None,
    };

    record.insert("category".to_string(), category.unwrap_or(Value::Null));
    record.insert("goal".to_string(), goal.unwrap_or(Value::Null));
    Ok(())
}

fn json_to_sql(column: Column, value: &Value) -> StoreResult<SqlValue> {
    match (column.kind, value) {
        (_, Value::Null) => Ok(SqlValue::Null),
        (ColumnKind::Bool, Value::Bool(flag)) => Ok(SqlValue::Integer(i64::from(*flag))),
        (ColumnKind::Integer, Value::Number(number)) => number
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| mismatch(column, value)),
        (ColumnKind::Text, Value::String(text)) => Ok(SqlValue::Text(text.clone())),
        _ => Err(mismatch(column, value)),
    }
}

fn mismatch(column: Column, value: &Value) -> StoreError {
    StoreError::InvalidRecord(format!(
        "value `{value}` does not fit column `{}` ({:?})",
        column.name, column.kind
    ))
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
