//! In-memory mirror of remote records.
//!
//! # Responsibility
//! - Hold categories, goals, and tasks keyed by id in a stable order.
//! - Apply cross-collection unlinking the store performs server-side.
//!
//! # Invariants
//! - One record per id; `upsert` replaces in place.
//! - Mutations here never perform I/O.

mod state;

pub use state::AppState;

use crate::model::category::Category;
use crate::model::goal::Goal;
use crate::model::task::Task;
use crate::model::EntityId;
use std::collections::HashMap;

/// Records that can live in an `EntityCache`.
pub trait Entity: Clone {
    fn id(&self) -> EntityId;
}

impl Entity for Category {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Goal {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Task {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Ordered id-keyed collection with O(1) lookup.
#[derive(Debug, Clone)]
pub struct EntityCache<T> {
    order: Vec<EntityId>,
    records: HashMap<EntityId, T>,
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
        }
    }
}

impl<T: Entity> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record, returning the previous value.
    ///
    /// New ids append to the end; existing ids keep their position.
    pub fn upsert(&mut self, entity: T) -> Option<T> {
        let id = entity.id();
        let previous = self.records.insert(id, entity);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let removed = self.records.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed)
    }

    pub fn find(&self, id: EntityId) -> Option<&T> {
        self.records.get(&id)
    }

    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// Records in natural (insertion) order.
    pub fn all(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Mutable access in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.records.values_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replaces all content. A repeated id keeps its first position and the
    /// last value seen.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.order.clear();
        self.records.clear();
        for item in items {
            self.upsert(item);
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.records.retain(|_, record| keep(record));
        let records = &self.records;
        self.order.retain(|id| records.contains_key(id));
    }
}
