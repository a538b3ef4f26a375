//! Goal record.
//!
//! # Invariants
//! - Goals are created `active`; `archived` is terminal.
//! - `order` sequences active goals; `1..N` after a reorder, gaps tolerated
//!   otherwise. A missing wire value reads as `0`.
//! - Coloring comes from `kind` through its display category name, not from
//!   a stored foreign key.

use crate::model::{normalize_optional_text, null_as_default, EntityId, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Goal classification, stored as `goal_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Travel,
    Personal,
    Career,
    Health,
    Financial,
    Learning,
    #[default]
    #[serde(other)]
    Other,
}

impl GoalKind {
    pub const ALL: [GoalKind; 7] = [
        GoalKind::Travel,
        GoalKind::Personal,
        GoalKind::Career,
        GoalKind::Health,
        GoalKind::Financial,
        GoalKind::Learning,
        GoalKind::Other,
    ];

    /// Name of the category whose color this kind borrows.
    pub fn display_category_name(self) -> &'static str {
        match self {
            Self::Travel => "Travel",
            Self::Personal => "Personal",
            Self::Career => "Work",
            Self::Health => "Health",
            Self::Financial => "Finance",
            Self::Learning => "Learning",
            Self::Other => "Other",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Personal => "personal",
            Self::Career => "career",
            Self::Health => "health",
            Self::Financial => "financial",
            Self::Learning => "learning",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    /// Older records wrote `completed` for the same terminal state.
    #[serde(alias = "completed")]
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "goal_type", default, deserialize_with = "null_as_default")]
    pub kind: GoalKind,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: GoalStatus,
    #[serde(rename = "user_order", default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    pub(crate) fn apply_draft(&mut self, draft: &GoalDraft, now: DateTime<Utc>) {
        self.name = draft.name.clone();
        self.description = draft.description.clone();
        self.kind = draft.kind;
        self.due_date = draft.due_date;
        self.updated_at = Some(now);
    }
}

/// User input for creating or editing a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub name: String,
    pub description: Option<String>,
    pub kind: GoalKind,
    pub due_date: Option<NaiveDate>,
}

impl GoalDraft {
    pub fn new(name: impl Into<String>, kind: GoalKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns a trimmed copy; blank descriptions become absent.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            description: normalize_optional_text(self.description.as_deref()),
            kind: self.kind,
            due_date: self.due_date,
        })
    }

    pub(crate) fn to_record(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "goal_type": self.kind.as_str(),
            "due_date": self.due_date,
        })
    }
}
