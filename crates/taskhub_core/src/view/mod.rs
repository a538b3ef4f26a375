//! Derived, presentation-ready values computed from `AppState`.
//!
//! # Responsibility
//! - Compute progress, severity, due-date text, and filtered lists on demand.
//!
//! # Invariants
//! - Every function is pure over `(state, inputs, today)`; nothing is cached.
//! - Dates are compared as calendar dates; time of day never matters.

pub mod dates;
pub mod goals;
pub mod tasks;

pub use dates::{
    day_offset, format_due_date, format_goal_due_date, overdue_severity, GoalDueText,
    OverdueSeverity,
};
pub use goals::{
    active_goals, goal_cards, goal_category, goal_progress, goal_task_counts, GoalCard,
    GoalTaskCounts,
};
pub use tasks::{filtered_tasks, task_view_counts, TaskFilter, TaskView, TaskViewCounts};

use chrono::{Local, NaiveDate};

/// Today's date in the local time zone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
