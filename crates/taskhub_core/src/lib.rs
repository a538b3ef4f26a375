//! Core domain logic for TaskHub.
//! Categories, goals, and tasks mirrored from a record store, the views
//! derived from them, and the coordinator that mutates both.

pub mod cache;
pub mod config;
pub mod events;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod view;

pub use cache::{AppState, EntityCache};
pub use config::{ConfigError, HubConfig};
pub use events::{EventBus, HubEvent, Notice, NoticeLevel, SubscriptionId};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryDraft, CATEGORY_COLORS};
pub use model::goal::{Goal, GoalDraft, GoalKind, GoalStatus};
pub use model::task::{Recurrence, RecurrencePattern, Task, TaskDraft, TaskStatus};
pub use model::{EntityId, ValidationError};
pub use service::{
    ActionOutcome, Coordinator, DeletionImpact, GoalDrag, ReorderOutcome, ReorderRequest,
    ServiceError, ServiceResult,
};
pub use store::sqlite::SqliteRecordStore;
pub use store::{Collection, RecordFilter, RecordStore, StoreError, StoreResult};
pub use view::{TaskFilter, TaskView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
