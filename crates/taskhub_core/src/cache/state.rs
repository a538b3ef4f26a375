use super::EntityCache;
use crate::model::category::Category;
use crate::model::goal::Goal;
use crate::model::task::{CategoryRef, Task};
use crate::model::EntityId;

/// Application state owned by the coordinator and read by views.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub categories: EntityCache<Category>,
    pub goals: EntityCache<Goal>,
    pub tasks: EntityCache<Task>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors `ON DELETE SET NULL` for a removed category.
    ///
    /// Returns the number of tasks that were unlinked.
    pub fn unlink_category(&mut self, category_id: EntityId) -> usize {
        let mut unlinked = 0;
        for task in self.tasks.values_mut() {
            if task.category_id == Some(category_id) {
                task.category_id = None;
                task.category = None;
                unlinked += 1;
            }
        }
        unlinked
    }

    /// Mirrors `ON DELETE SET NULL` for a removed goal.
    pub fn unlink_goal(&mut self, goal_id: EntityId) -> usize {
        let mut unlinked = 0;
        for task in self.tasks.values_mut() {
            if task.goal_id == Some(goal_id) {
                task.goal_id = None;
                task.goal = None;
                unlinked += 1;
            }
        }
        unlinked
    }

    /// Refreshes joined category copies after a rename or recolor.
    pub fn refresh_category_join(&mut self, category: &Category) {
        for task in self.tasks.values_mut() {
            if task.category_id == Some(category.id) {
                task.category = Some(CategoryRef {
                    id: category.id,
                    name: category.name.clone(),
                    color_hex: Some(category.color_hex.clone()),
                });
            }
        }
    }

    /// Refreshes joined goal names after an edit.
    pub fn refresh_goal_join(&mut self, goal: &Goal) {
        for task in self.tasks.values_mut() {
            if let Some(joined) = task.goal.as_mut().filter(|joined| joined.id == goal.id) {
                joined.name = goal.name.clone();
            }
        }
    }

    pub fn max_goal_order(&self) -> i64 {
        self.goals.all().map(|goal| goal.order).max().unwrap_or(0).max(0)
    }

    pub fn max_task_order(&self) -> i64 {
        self.tasks.all().map(|task| task.order).max().unwrap_or(0).max(0)
    }

    /// Tasks referencing `category_id`.
    pub fn tasks_in_category(&self, category_id: EntityId) -> usize {
        self.tasks
            .all()
            .filter(|task| task.category_id == Some(category_id))
            .count()
    }

    /// Goals whose kind maps to the category with `category_id`.
    pub fn goals_colored_by(&self, category_id: EntityId) -> usize {
        self.goals
            .all()
            .filter(|goal| {
                self.categories
                    .all()
                    .find(|category| category.name == goal.kind.display_category_name())
                    .is_some_and(|category| category.id == category_id)
            })
            .count()
    }
}
