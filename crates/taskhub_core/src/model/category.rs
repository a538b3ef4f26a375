//! Category record and palette.
//!
//! # Invariants
//! - Category names are unique ignoring ASCII/Unicode case.
//! - `color_hex` is always one of `CATEGORY_COLORS`.
//! - Deleting a category unlinks referencing tasks; it never cascades.

use crate::model::{EntityId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fixed palette offered for category colors.
pub const CATEGORY_COLORS: [&str; 17] = [
    "#EF4444", "#F97316", "#F59E0B", "#EAB308", "#84CC16", "#10B981", "#14B8A6", "#06B6D4",
    "#0EA5E9", "#3B82F6", "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899", "#F43F5E",
    "#64748B",
];

/// Preselected color for new categories.
pub const DEFAULT_CATEGORY_COLOR: &str = CATEGORY_COLORS[0];

/// Returns the palette entry matching `value`, ignoring case.
pub fn palette_color(value: &str) -> Option<&'static str> {
    let trimmed = value.trim();
    CATEGORY_COLORS
        .iter()
        .copied()
        .find(|color| color.eq_ignore_ascii_case(trimmed))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub color_hex: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Case-insensitive name comparison used by the duplicate guard.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// User input for creating or editing a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub color_hex: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>, color_hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color_hex: color_hex.into(),
        }
    }

    /// Returns a trimmed copy with the canonical palette spelling.
    ///
    /// # Errors
    /// - `EmptyName` when the name is blank.
    /// - `UnknownColor` when the color is outside the palette.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let color = palette_color(&self.color_hex)
            .ok_or_else(|| ValidationError::UnknownColor(self.color_hex.clone()))?;
        Ok(Self {
            name: name.to_string(),
            color_hex: color.to_string(),
        })
    }

    pub(crate) fn to_record(&self) -> Value {
        json!({
            "name": self.name,
            "color_hex": self.color_hex,
        })
    }
}
