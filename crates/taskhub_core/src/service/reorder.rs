//! Drag-and-drop goal reordering (cache first, then sequential writes).
//!
//! # Invariants
//! - Active goal orders stay unique after every individual store write.
//! - A failed reorder leaves each goal's cached order equal to its stored one.

use super::coordinator::{Coordinator, ServiceError, ServiceResult};
use crate::model::EntityId;
use crate::store::{Collection, RecordStore};
use crate::view::active_goals;
use log::{info, warn};
use serde_json::json;
use std::collections::HashMap;

/// One drag gesture over the active goal list.
///
/// Lives from drag start to drop; dropping consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalDrag {
    dragged: EntityId,
}

impl GoalDrag {
    pub fn start(dragged: EntityId) -> Self {
        Self { dragged }
    }

    pub fn dragged(&self) -> EntityId {
        self.dragged
    }

    /// Ends the gesture over `target`. Dropping a goal on itself is a no-op.
    pub fn drop_on(self, target: EntityId) -> Option<ReorderRequest> {
        (self.dragged != target).then_some(ReorderRequest {
            dragged: self.dragged,
            target,
        })
    }
}

/// Place `dragged` immediately before `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderRequest {
    pub dragged: EntityId,
    pub target: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// `persisted` goals had their order written.
    Reordered { persisted: usize },
    /// The list already had this order.
    Unchanged,
    /// Either goal is not an active cached goal.
    NotFound,
}

#[derive(Debug, Clone, Copy)]
struct OrderChange {
    id: EntityId,
    previous: i64,
    order: i64,
}

impl<S: RecordStore> Coordinator<S> {
    /// Moves a goal before another and renumbers active goals `1..N`.
    ///
    /// New orders apply to the cache immediately, then the writes from
    /// [`plan_writes`] go out in sequence. On the first failed write every
    /// changed goal takes the order the store last accepted for it, so the
    /// cache matches the store and no two active goals share an order.
    pub async fn reorder_goals(&mut self, request: ReorderRequest) -> ServiceResult<ReorderOutcome> {
        if request.dragged == request.target {
            return Ok(ReorderOutcome::Unchanged);
        }

        let stored: Vec<(EntityId, i64)> = active_goals(&self.state)
            .into_iter()
            .map(|goal| (goal.id, goal.order))
            .collect();
        let mut sequence = stored.clone();
        let Some(from) = sequence.iter().position(|(id, _)| *id == request.dragged) else {
            return Ok(ReorderOutcome::NotFound);
        };
        let moved = sequence.remove(from);
        let Some(to) = sequence.iter().position(|(id, _)| *id == request.target) else {
            return Ok(ReorderOutcome::NotFound);
        };
        sequence.insert(to, moved);

        let changes: Vec<OrderChange> = sequence
            .iter()
            .enumerate()
            .filter_map(|(index, (id, previous))| {
                let order = index as i64 + 1;
                (order != *previous).then_some(OrderChange {
                    id: *id,
                    previous: *previous,
                    order,
                })
            })
            .collect();
        if changes.is_empty() {
            return Ok(ReorderOutcome::Unchanged);
        }

        for change in &changes {
            if let Some(goal) = self.state.goals.find_mut(change.id) {
                goal.order = change.order;
            }
        }
        self.publish_changed(&[Collection::Goals]);

        let writes = plan_writes(&stored, &changes);
        for (step, &(id, order)) in writes.iter().enumerate() {
            let patch = json!({ "user_order": order });
            if let Err(err) = self.store.update(Collection::Goals, id, patch).await {
                let mut saved: HashMap<EntityId, i64> = changes
                    .iter()
                    .map(|change| (change.id, change.previous))
                    .collect();
                saved.extend(writes[..step].iter().copied());
                for change in &changes {
                    let order = saved.get(&change.id).copied().unwrap_or(change.previous);
                    match self.state.goals.find_mut(change.id) {
                        Some(goal) if goal.order == change.order => goal.order = order,
                        Some(_) => {}
                        None => warn!(
                            "event=goal_reorder module=service status=rollback_skipped reason=not_found goal_id={}",
                            change.id
                        ),
                    }
                }
                self.publish_changed(&[Collection::Goals]);
                self.report_remote("goal_reorder", "Failed to reorder goals", &err);
                return Err(ServiceError::PartialReorder {
                    failed: id,
                    persisted: step,
                    source: err,
                });
            }
        }

        info!(
            "event=goal_reorder module=service status=ok dragged={} target={} persisted={} writes={}",
            request.dragged,
            request.target,
            changes.len(),
            writes.len()
        );
        Ok(ReorderOutcome::Reordered {
            persisted: changes.len(),
        })
    }
}

/// Orders the writes that move each goal in `changes` to its new order.
///
/// `stored` holds the current order of every active goal. After any prefix
/// of the result, no two active goals share an order. When every pending
/// target is still taken, the goal holding the first target is parked on
/// an unused value below the list and written again later.
fn plan_writes(stored: &[(EntityId, i64)], changes: &[OrderChange]) -> Vec<(EntityId, i64)> {
    let mut held = stored.to_vec();
    let mut pending: Vec<&OrderChange> = changes.iter().collect();
    let mut parking = held.iter().map(|(_, order)| *order).min().unwrap_or(1).min(1) - 1;
    let mut writes = Vec::with_capacity(changes.len() + 1);

    while !pending.is_empty() {
        let free = pending.iter().position(|change| {
            !held
                .iter()
                .any(|(id, order)| *id != change.id && *order == change.order)
        });
        let holder = match free {
            Some(_) => None,
            None => held
                .iter()
                .find(|(id, order)| {
                    *order == pending[0].order && pending.iter().any(|change| change.id == *id)
                })
                .map(|(id, _)| *id),
        };

        let (id, order) = match (free, holder) {
            (_, Some(holder)) => {
                let value = parking;
                parking -= 1;
                (holder, value)
            }
            (Some(index), None) => {
                let change = pending.remove(index);
                (change.id, change.order)
            }
            // Only reachable when the stored orders already collide.
            (None, None) => {
                let change = pending.remove(0);
                (change.id, change.order)
            }
        };
        if let Some(entry) = held.iter_mut().find(|(held_id, _)| *held_id == id) {
            entry.1 = order;
        }
        writes.push((id, order));
    }
    writes
}
