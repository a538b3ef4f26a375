//! Domain model for categories, goals, and tasks.
//!
//! # Responsibility
//! - Define the records mirrored from the remote store.
//! - Own input validation for user-authored drafts.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `EntityId`.
//! - Wire field names are snake_case and match the remote store columns.
//! - Progress is never stored; it is derived from linked tasks.

pub mod category;
pub mod goal;
pub mod task;

use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier shared by every cached record.
pub type EntityId = Uuid;

/// Local validation failures, raised before any remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Category or goal name is blank after trim.
    EmptyName,
    /// Task title is blank after trim.
    EmptyTitle,
    /// Another category already uses this name (case-insensitive).
    DuplicateCategoryName(String),
    /// Color is not part of `CATEGORY_COLORS`.
    UnknownColor(String),
    /// Recurrence interval must be at least 1.
    InvalidRecurrenceInterval(i64),
    /// Weekly recurrence day must be in `0..=6`.
    InvalidDayOfWeek(i64),
    /// Recurrence flag set without the fields it requires.
    IncompleteRecurrence(&'static str),
    /// A referenced selection is not present locally.
    MissingSelection(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::DuplicateCategoryName(name) => {
                write!(f, "a category named `{name}` already exists")
            }
            Self::UnknownColor(value) => write!(f, "color `{value}` is not in the palette"),
            Self::InvalidRecurrenceInterval(value) => {
                write!(f, "recurrence interval must be >= 1, got {value}")
            }
            Self::InvalidDayOfWeek(value) => {
                write!(f, "recurrence day of week must be within 0..=6, got {value}")
            }
            Self::IncompleteRecurrence(field) => {
                write!(f, "recurring task is missing `{field}`")
            }
            Self::MissingSelection(what) => write!(f, "selected {what} does not exist"),
        }
    }
}

impl Error for ValidationError {}

/// Trims user text and maps blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Treats an explicit wire `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
