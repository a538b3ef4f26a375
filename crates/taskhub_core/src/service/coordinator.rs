use crate::cache::AppState;
use crate::events::{EventBus, HubEvent, Notice, SubscriptionId};
use crate::model::category::Category;
use crate::model::goal::Goal;
use crate::model::task::Task;
use crate::model::{EntityId, ValidationError};
use crate::store::{Collection, RecordFilter, RecordStore, StoreError};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected locally; nothing was sent or changed.
    Validation(ValidationError),
    /// The store call failed; optimistic changes were compensated.
    Remote(StoreError),
    /// A record returned by the store could not be decoded.
    InvalidData(String),
    /// A reorder stopped at `failed`; the first `persisted` writes stand.
    PartialReorder {
        failed: EntityId,
        persisted: usize,
        source: StoreError,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid store data: {message}"),
            Self::PartialReorder {
                failed,
                persisted,
                source,
            } => write!(
                f,
                "reorder stopped at goal {failed} after {persisted} saved update(s): {source}"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::PartialReorder { source, .. } => Some(source),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of an action guarded by lookup or user confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// The confirmation callback declined.
    Cancelled,
    /// No cached record has this id.
    NotFound,
    /// The record was already in the requested state.
    Unchanged,
}

/// What a delete will unlink, shown to the user before confirming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionImpact {
    pub collection: Collection,
    pub name: String,
    pub tasks: usize,
    pub goals: usize,
}

impl DeletionImpact {
    pub fn has_dependents(&self) -> bool {
        self.tasks > 0 || self.goals > 0
    }

    /// Confirmation prompt naming the affected counts.
    pub fn message(&self) -> String {
        match self.collection {
            Collection::Categories => {
                let mut message = format!("Delete \"{}\" category?", self.name);
                if self.has_dependents() {
                    message.push_str(&format!(
                        "\n\n{} task(s) and {} goal(s) will be unlinked.",
                        self.tasks, self.goals
                    ));
                }
                message
            }
            Collection::Goals => {
                let mut message = format!(
                    "Delete goal \"{}\"? This action cannot be undone.",
                    self.name
                );
                if self.has_dependents() {
                    message.push_str(&format!("\n\n{} task(s) will be unlinked.", self.tasks));
                }
                message
            }
            Collection::Tasks => format!("Delete task \"{}\"?", self.name),
        }
    }
}

/// Owns the store, the cached state, and the subscriber list.
pub struct Coordinator<S: RecordStore> {
    pub(super) store: S,
    pub(super) state: AppState,
    events: EventBus,
}

impl<S: RecordStore> Coordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: AppState::new(),
            events: EventBus::new(),
        }
    }

    /// Read-only snapshot for views.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&mut self, subscriber: impl Fn(&HubEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Replaces the cache with the store's current categories, goals, and
    /// active tasks.
    pub async fn load(&mut self) -> ServiceResult<()> {
        let started_at = Instant::now();
        let categories: Vec<Category> = self
            .fetch(Collection::Categories, &RecordFilter::all())
            .await?;
        let goals: Vec<Goal> = self.fetch(Collection::Goals, &RecordFilter::all()).await?;
        let tasks: Vec<Task> = self
            .fetch(
                Collection::Tasks,
                &RecordFilter::all().eq("status", "active"),
            )
            .await?;

        self.state.categories.replace_all(categories);
        self.state.goals.replace_all(goals);
        self.state.tasks.replace_all(tasks);

        info!(
            "event=state_load module=service status=ok categories={} goals={} tasks={} duration_ms={}",
            self.state.categories.len(),
            self.state.goals.len(),
            self.state.tasks.len(),
            started_at.elapsed().as_millis()
        );
        self.publish_changed(&Collection::ALL);
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> ServiceResult<Vec<T>> {
        let records = match self.store.select(collection, filter).await {
            Ok(records) => records,
            Err(err) => return Err(self.remote_failure("state_load", "Failed to load data", err)),
        };
        records
            .into_iter()
            .map(|record| decode(collection, record))
            .collect()
    }

    pub(super) fn publish_changed(&self, collections: &[Collection]) {
        for collection in collections {
            self.events.publish(&HubEvent::Changed(*collection));
        }
    }

    pub(super) fn notify_success(&self, message: &str) {
        self.events
            .publish(&HubEvent::Notice(Notice::success(message)));
    }

    /// Logs a store failure and shows the user a short error notice.
    pub(super) fn report_remote(&self, event: &str, user_message: &str, err: &StoreError) {
        error!("event={event} module=service status=error error={err}");
        self.events
            .publish(&HubEvent::Notice(Notice::error(user_message)));
    }

    pub(super) fn remote_failure(
        &self,
        event: &str,
        user_message: &str,
        err: StoreError,
    ) -> ServiceError {
        self.report_remote(event, user_message, &err);
        ServiceError::Remote(err)
    }

    pub(super) fn rejected(&self, event: &str, err: ValidationError) -> ServiceError {
        warn!("event={event} module=service status=rejected reason={err}");
        ServiceError::Validation(err)
    }
}

pub(super) fn decode<T: DeserializeOwned>(collection: Collection, record: Value) -> ServiceResult<T> {
    serde_json::from_value(record).map_err(|err| {
        error!("event=record_decode module=service status=error collection={collection} error={err}");
        ServiceError::InvalidData(format!("{collection} record: {err}"))
    })
}

/// Adds store-facing fields to a draft's record.
pub(super) fn with_fields(record: Value, extra: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut map = match record {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in extra {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}
