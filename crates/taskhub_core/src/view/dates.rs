//! Due-date arithmetic and display text.
//!
//! Task and goal cards word the same offset differently, so the two
//! formatters stay separate.

use chrono::NaiveDate;
use serde::Serialize;

/// How far past due an incomplete task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdueSeverity {
    Low,
    Medium,
    High,
}

impl OverdueSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Whole days from `today` to `date`; negative when `date` is in the past.
pub fn day_offset(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// `>= 7` days late is high, `>= 3` medium, `>= 1` low.
pub fn overdue_severity(due_date: NaiveDate, today: NaiveDate) -> Option<OverdueSeverity> {
    match -day_offset(due_date, today) {
        days if days >= 7 => Some(OverdueSeverity::High),
        days if days >= 3 => Some(OverdueSeverity::Medium),
        days if days >= 1 => Some(OverdueSeverity::Low),
        _ => None,
    }
}

/// Task card wording.
pub fn format_due_date(due_date: NaiveDate, today: NaiveDate) -> String {
    match day_offset(due_date, today) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        days @ 2..=7 => format!("In {days} days"),
        days if days < 0 => format!("{} days ago", days.unsigned_abs()),
        _ => month_day(due_date),
    }
}

/// Goal card due text plus overdue flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalDueText {
    pub text: String,
    pub is_overdue: bool,
}

/// Goal card wording; `None` reads as "No date".
pub fn format_goal_due_date(due_date: Option<NaiveDate>, today: NaiveDate) -> GoalDueText {
    let Some(due_date) = due_date else {
        return GoalDueText {
            text: "No date".to_string(),
            is_overdue: false,
        };
    };

    let days = day_offset(due_date, today);
    let text = match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        2..=30 => format!("{days} days"),
        days if days < 0 => format!("{}d overdue", days.unsigned_abs()),
        _ => month_day(due_date),
    };

    GoalDueText {
        text,
        is_overdue: days < 0,
    }
}

fn month_day(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
