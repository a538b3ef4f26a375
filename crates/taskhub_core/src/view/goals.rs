//! Goal ordering, task-derived progress, and card projections.

use crate::cache::AppState;
use crate::model::category::Category;
use crate::model::goal::Goal;
use crate::model::EntityId;
use crate::view::dates::{format_goal_due_date, GoalDueText};
use chrono::NaiveDate;
use serde::Serialize;

/// Linked task totals for one goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoalTaskCounts {
    pub total: usize,
    pub completed: usize,
}

impl GoalTaskCounts {
    /// Rounded completion percentage, halves rounding up; `0` with no tasks.
    pub fn percent(self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let completed = self.completed as u64;
        let total = self.total as u64;
        // round(100 * c / t) without floating point.
        ((200 * completed + total) / (2 * total)) as u32
    }
}

pub fn goal_task_counts(state: &AppState, goal_id: EntityId) -> GoalTaskCounts {
    state
        .tasks
        .all()
        .filter(|task| task.is_active() && task.goal_id == Some(goal_id))
        .fold(GoalTaskCounts::default(), |mut counts, task| {
            counts.total += 1;
            if task.is_completed {
                counts.completed += 1;
            }
            counts
        })
}

pub fn goal_progress(state: &AppState, goal_id: EntityId) -> u32 {
    goal_task_counts(state, goal_id).percent()
}

/// Active goals, stably sorted by `order` ascending.
pub fn active_goals(state: &AppState) -> Vec<&Goal> {
    let mut goals: Vec<&Goal> = state.goals.all().filter(|goal| goal.is_active()).collect();
    goals.sort_by_key(|goal| goal.order);
    goals
}

/// Category whose name matches the goal kind's display name.
pub fn goal_category<'a>(state: &'a AppState, goal: &Goal) -> Option<&'a Category> {
    let wanted = goal.kind.display_category_name();
    state
        .categories
        .all()
        .find(|category| category.name == wanted)
}

/// Everything a goal card shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalCard<'a> {
    pub goal: &'a Goal,
    pub progress: u32,
    pub counts: GoalTaskCounts,
    pub due: GoalDueText,
    pub category: Option<&'a Category>,
    /// Fully complete goals offer archiving.
    pub can_archive: bool,
}

pub fn goal_cards(state: &AppState, today: NaiveDate) -> Vec<GoalCard<'_>> {
    active_goals(state)
        .into_iter()
        .map(|goal| {
            let counts = goal_task_counts(state, goal.id);
            let progress = counts.percent();
            GoalCard {
                goal,
                progress,
                counts,
                due: format_goal_due_date(goal.due_date, today),
                category: goal_category(state, goal),
                can_archive: progress >= 100,
            }
        })
        .collect()
}
