//! Task list filtering and tab counts.

use crate::cache::AppState;
use crate::model::task::Task;
use crate::model::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Date-based task tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskView {
    #[default]
    All,
    /// Incomplete, due strictly before today.
    Overdue,
    /// Incomplete, due today or later.
    Upcoming,
}

impl TaskView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Overdue => "overdue",
            Self::Upcoming => "upcoming",
        }
    }

    fn admits(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Overdue => {
                !task.is_completed && task.due_date.is_some_and(|due| due < today)
            }
            Self::Upcoming => {
                !task.is_completed && task.due_date.is_some_and(|due| due >= today)
            }
        }
    }
}

impl Display for TaskView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskView {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "overdue" => Ok(Self::Overdue),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(format!(
                "unsupported task view `{other}`; expected all|overdue|upcoming"
            )),
        }
    }
}

/// Current list selections; all criteria combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub view: TaskView,
    pub search: String,
    pub category_id: Option<EntityId>,
    pub goal_id: Option<EntityId>,
}

impl TaskFilter {
    pub fn view(view: TaskView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
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
}

/// Visible tasks for `filter`, in cache order.
pub fn filtered_tasks<'a>(
    state: &'a AppState,
    filter: &TaskFilter,
    today: NaiveDate,
) -> impl Iterator<Item = &'a Task> + 'a {
    let view = filter.view;
    // Blank input means no search; anything else matches as typed.
    let needle = if filter.search.trim().is_empty() {
        String::new()
    } else {
        filter.search.to_lowercase()
    };
    let category_id = filter.category_id;
    let goal_id = filter.goal_id;

    state.tasks.all().filter(move |task| {
        task.is_active()
            && view.admits(task, today)
            && (needle.is_empty() || task.matches_search(&needle))
            && category_id.map_or(true, |id| task.category_id == Some(id))
            && goal_id.map_or(true, |id| task.goal_id == Some(id))
    })
}

/// Tab badge counts, over incomplete tasks only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskViewCounts {
    pub all: usize,
    pub overdue: usize,
    pub upcoming: usize,
}

pub fn task_view_counts(state: &AppState, today: NaiveDate) -> TaskViewCounts {
    state
        .tasks
        .all()
        .filter(|task| task.is_active() && !task.is_completed)
        .fold(TaskViewCounts::default(), |mut counts, task| {
            counts.all += 1;
            if TaskView::Overdue.admits(task, today) {
                counts.overdue += 1;
            }
            if TaskView::Upcoming.admits(task, today) {
                counts.upcoming += 1;
            }
            counts
        })
}
