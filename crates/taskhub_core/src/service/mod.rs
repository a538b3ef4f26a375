//! Mutation coordinator: the only writer of `AppState`.
//!
//! # Responsibility
//! - Validate user input locally before any remote call.
//! - Write through the `RecordStore` and mirror results into the cache.
//! - Notify subscribed views after every cache change.
//!
//! # Invariants
//! - Full-entity create/update/delete: store first, cache only on success.
//! - Completion toggle and goal reorder: cache first, compensate on failure.
//! - Unknown ids are silent no-ops.
//! - Rollbacks re-check that the record is still cached.

mod category_service;
mod coordinator;
mod goal_service;
mod reorder;
mod task_service;

pub use coordinator::{
    ActionOutcome, Coordinator, DeletionImpact, ServiceError, ServiceResult,
};
pub use reorder::{GoalDrag, ReorderOutcome, ReorderRequest};
