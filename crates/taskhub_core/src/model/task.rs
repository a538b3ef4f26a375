//! Task record, recurrence rules, and the flattened wire shape.
//!
//! # Responsibility
//! - Keep completion flag and completion timestamp in lockstep.
//! - Make partial recurrence states unrepresentable in memory.
//! - Translate between the in-memory shape and the store's flat columns.
//!
//! # Invariants
//! - `is_completed == completed_at.is_some()` after every mutation made here.
//! - Disabled recurrence always travels as five cleared wire fields.
//! - `category`/`goal` joins are read-only copies supplied by the store.

use crate::model::{normalize_optional_text, null_as_default, EntityId, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Active,
    /// Soft-deleted; hidden everywhere, kept remotely.
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
}

/// Repetition unit. Only weekly rules carry a day of week (`0` = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrencePattern {
    Daily,
    Weekly { day_of_week: u8 },
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub interval: u32,
    pub ends_on: Option<NaiveDate>,
}

impl Recurrence {
    pub fn daily(interval: u32) -> Result<Self, ValidationError> {
        Self::build(RecurrencePattern::Daily, interval)
    }

    pub fn weekly(interval: u32, day_of_week: u8) -> Result<Self, ValidationError> {
        if day_of_week > 6 {
            return Err(ValidationError::InvalidDayOfWeek(i64::from(day_of_week)));
        }
        Self::build(RecurrencePattern::Weekly { day_of_week }, interval)
    }

    pub fn monthly(interval: u32) -> Result<Self, ValidationError> {
        Self::build(RecurrencePattern::Monthly, interval)
    }

    pub fn ending_on(mut self, ends_on: NaiveDate) -> Self {
        self.ends_on = Some(ends_on);
        self
    }

    pub fn kind(&self) -> RecurrenceType {
        match self.pattern {
            RecurrencePattern::Daily => RecurrenceType::Daily,
            RecurrencePattern::Weekly { .. } => RecurrenceType::Weekly,
            RecurrencePattern::Monthly => RecurrenceType::Monthly,
        }
    }

    pub fn day_of_week(&self) -> Option<u8> {
        match self.pattern {
            RecurrencePattern::Weekly { day_of_week } => Some(day_of_week),
            _ => None,
        }
    }

    fn build(pattern: RecurrencePattern, interval: u32) -> Result<Self, ValidationError> {
        if interval < 1 {
            return Err(ValidationError::InvalidRecurrenceInterval(i64::from(
                interval,
            )));
        }
        Ok(Self {
            pattern,
            interval,
            ends_on: None,
        })
    }
}

/// Flat recurrence columns as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RecurrenceFields {
    #[serde(default, deserialize_with = "null_as_default")]
    is_recurring: bool,
    #[serde(default)]
    recurrence_type: Option<RecurrenceType>,
    #[serde(default)]
    recurrence_interval: Option<i64>,
    #[serde(default)]
    recurrence_day_of_week: Option<i64>,
    #[serde(default)]
    recurrence_ends_on: Option<NaiveDate>,
}

impl RecurrenceFields {
    pub(crate) fn from_recurrence(recurrence: Option<&Recurrence>) -> Self {
        match recurrence {
            None => Self::default(),
            Some(rule) => Self {
                is_recurring: true,
                recurrence_type: Some(rule.kind()),
                recurrence_interval: Some(i64::from(rule.interval)),
                recurrence_day_of_week: rule.day_of_week().map(i64::from),
                recurrence_ends_on: rule.ends_on,
            },
        }
    }

    /// Rebuilds the rule. Residual columns on a non-recurring row are ignored;
    /// a missing interval reads as `1`.
    pub(crate) fn into_recurrence(self) -> Result<Option<Recurrence>, ValidationError> {
        if !self.is_recurring {
            return Ok(None);
        }
        let kind = self
            .recurrence_type
            .ok_or(ValidationError::IncompleteRecurrence("recurrence_type"))?;
        let interval = self.recurrence_interval.unwrap_or(1);
        let interval = u32::try_from(interval)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or(ValidationError::InvalidRecurrenceInterval(interval))?;

        let rule = match kind {
            RecurrenceType::Daily => Recurrence::daily(interval)?,
            RecurrenceType::Monthly => Recurrence::monthly(interval)?,
            RecurrenceType::Weekly => {
                let day = self
                    .recurrence_day_of_week
                    .ok_or(ValidationError::IncompleteRecurrence(
                        "recurrence_day_of_week",
                    ))?;
                let day = u8::try_from(day)
                    .ok()
                    .filter(|value| *value <= 6)
                    .ok_or(ValidationError::InvalidDayOfWeek(day))?;
                Recurrence::weekly(interval, day)?
            }
        };

        Ok(Some(Recurrence {
            ends_on: self.recurrence_ends_on,
            ..rule
        }))
    }

    fn into_object(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("is_recurring".to_string(), json!(self.is_recurring));
        map.insert("recurrence_type".to_string(), json!(self.recurrence_type));
        map.insert(
            "recurrence_interval".to_string(),
            json!(self.recurrence_interval),
        );
        map.insert(
            "recurrence_day_of_week".to_string(),
            json!(self.recurrence_day_of_week),
        );
        map.insert(
            "recurrence_ends_on".to_string(),
            json!(self.recurrence_ends_on),
        );
        map
    }
}

/// Category fields the store joins onto task reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub color_hex: Option<String>,
}

/// Goal fields the store joins onto task reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRef {
    pub id: EntityId,
    pub name: String,
}

/// Wire shape of a task row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    id: EntityId,
    title: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    category_id: Option<EntityId>,
    #[serde(default)]
    goal_id: Option<EntityId>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    is_completed: bool,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    user_order: i64,
    #[serde(flatten)]
    recurrence: RecurrenceFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<CategoryRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    goal: Option<GoalRef>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub notes: Option<String>,
    pub category_id: Option<EntityId>,
    pub goal_id: Option<EntityId>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub order: i64,
    pub recurrence: Option<Recurrence>,
    pub category: Option<CategoryRef>,
    pub goal: Option<GoalRef>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = ValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let recurrence = record.recurrence.into_recurrence()?;
        // A completed row without a timestamp keeps the flag; the pair is
        // re-established on the next toggle.
        Ok(Self {
            id: record.id,
            title: record.title,
            notes: record.notes,
            category_id: record.category_id,
            goal_id: record.goal_id,
            due_date: record.due_date,
            is_completed: record.is_completed,
            completed_at: record.completed_at.filter(|_| record.is_completed),
            status: record.status,
            order: record.user_order,
            recurrence,
            category: record.category,
            goal: record.goal,
            created_at: record.created_at,
        })
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            notes: task.notes,
            category_id: task.category_id,
            goal_id: task.goal_id,
            due_date: task.due_date,
            is_completed: task.is_completed,
            completed_at: task.completed_at,
            status: task.status,
            user_order: task.order,
            recurrence: RecurrenceFields::from_recurrence(task.recurrence.as_ref()),
            category: task.category,
            goal: task.goal,
            created_at: task.created_at,
        }
    }
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Sets the completion flag and its timestamp together.
    pub fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.is_completed = completed;
        self.completed_at = completed.then_some(at);
    }

    /// Case-insensitive substring match against title or notes.
    pub fn matches_search(&self, needle_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(needle_lowercase)
            || self
                .notes
                .as_deref()
                .is_some_and(|notes| notes.to_lowercase().contains(needle_lowercase))
    }

    pub(crate) fn apply_draft(&mut self, draft: &TaskDraft) {
        if self.category_id != draft.category_id {
            self.category = None;
        }
        if self.goal_id != draft.goal_id {
            self.goal = None;
        }
        self.title = draft.title.clone();
        self.notes = draft.notes.clone();
        self.category_id = draft.category_id;
        self.goal_id = draft.goal_id;
        self.due_date = draft.due_date;
        self.recurrence = draft.recurrence;
    }
}

/// User input for creating or editing a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub notes: Option<String>,
    pub category_id: Option<EntityId>,
    pub goal_id: Option<EntityId>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<Recurrence>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_category(mut self, category_id: EntityId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_goal(mut self, goal_id: EntityId) -> Self {
        self.goal_id = Some(goal_id);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Returns a trimmed copy; blank notes become absent.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if let Some(rule) = &self.recurrence {
            if rule.interval < 1 {
                return Err(ValidationError::InvalidRecurrenceInterval(i64::from(
                    rule.interval,
                )));
            }
            if let Some(day) = rule.day_of_week().filter(|day| *day > 6) {
                return Err(ValidationError::InvalidDayOfWeek(i64::from(day)));
            }
        }
        Ok(Self {
            title: title.to_string(),
            notes: normalize_optional_text(self.notes.as_deref()),
            ..self.clone()
        })
    }

    /// Editable columns, always including all five recurrence fields.
    pub(crate) fn to_record(&self) -> Value {
        let mut map = Map::new();
        map.insert("title".to_string(), json!(self.title));
        map.insert("notes".to_string(), json!(self.notes));
        map.insert("category_id".to_string(), json!(self.category_id));
        map.insert("goal_id".to_string(), json!(self.goal_id));
        map.insert("due_date".to_string(), json!(self.due_date));
        map.extend(RecurrenceFields::from_recurrence(self.recurrence.as_ref()).into_object());
        Value::Object(map)
    }
}
