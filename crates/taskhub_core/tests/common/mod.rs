#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use taskhub_core::{
    Collection, Coordinator, EntityId, RecordFilter, RecordStore, SqliteRecordStore, StoreError,
    StoreResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug)]
struct Rule {
    op: Op,
    collection: Collection,
    skip: usize,
}

/// In-memory SQLite store that can fail scripted calls and records every
/// call it receives.
pub struct ScriptedStore {
    inner: SqliteRecordStore,
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(Op, Collection)>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteRecordStore::open_in_memory().unwrap(),
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails the next matching call.
    pub fn fail_next(&self, op: Op, collection: Collection) {
        self.fail_after(op, collection, 0);
    }

    /// Lets `skip` matching calls through, then fails one.
    pub fn fail_after(&self, op: Op, collection: Collection, skip: usize) {
        self.rules.lock().unwrap().push(Rule {
            op,
            collection,
            skip,
        });
    }

    pub fn count(&self, op: Op, collection: Collection) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == (op, collection))
            .count()
    }

    pub fn writes(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op != Op::Select)
            .count()
    }

    pub fn inner(&self) -> &SqliteRecordStore {
        &self.inner
    }

    fn check(&self, op: Op, collection: Collection) -> StoreResult<()> {
        self.calls.lock().unwrap().push((op, collection));
        let mut rules = self.rules.lock().unwrap();
        let Some(index) = rules
            .iter()
            .position(|rule| rule.op == op && rule.collection == collection)
        else {
            return Ok(());
        };
        if rules[index].skip > 0 {
            rules[index].skip -= 1;
            return Ok(());
        }
        rules.remove(index);
        Err(StoreError::Transport(format!(
            "scripted {op:?} failure on {collection}"
        )))
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn select(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> StoreResult<Vec<Value>> {
        self.check(Op::Select, collection)?;
        self.inner.select(collection, filter).await
    }

    async fn insert(&self, collection: Collection, record: Value) -> StoreResult<Value> {
        self.check(Op::Insert, collection)?;
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: Collection, id: EntityId, patch: Value) -> StoreResult<()> {
        self.check(Op::Update, collection)?;
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: EntityId) -> StoreResult<()> {
        self.check(Op::Delete, collection)?;
        self.inner.delete(collection, id).await
    }
}

pub async fn loaded_hub() -> Coordinator<ScriptedStore> {
    let mut hub = Coordinator::new(ScriptedStore::new());
    hub.load().await.unwrap();
    hub
}

/// Reads one stored record straight from the backing store.
pub async fn stored(
    hub: &Coordinator<ScriptedStore>,
    collection: Collection,
    id: EntityId,
) -> Value {
    hub.store()
        .inner()
        .select(collection, &RecordFilter::by_id(id))
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
}
