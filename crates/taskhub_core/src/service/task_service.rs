//! Task create/update/delete and optimistic completion toggling.

use super::coordinator::{
    decode, with_fields, ActionOutcome, Coordinator, DeletionImpact, ServiceResult,
};
use crate::model::task::{Task, TaskDraft, TaskStatus};
use crate::model::{EntityId, ValidationError};
use crate::store::{Collection, RecordFilter, RecordStore};
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::{json, Value};

impl<S: RecordStore> Coordinator<S> {
    /// Creates an active, incomplete task placed after every existing task.
    pub async fn create_task(&mut self, draft: &TaskDraft) -> ServiceResult<Task> {
        let draft = self.validate_task(draft)?;
        let record = with_fields(
            draft.to_record(),
            [
                ("is_completed", json!(false)),
                ("completed_at", Value::Null),
                ("status", json!("active")),
                ("user_order", json!(self.state.max_task_order() + 1)),
            ],
        );

        let record = match self.store.insert(Collection::Tasks, record).await {
            Ok(record) => record,
            Err(err) => return Err(self.remote_failure("task_create", "Failed to save task", err)),
        };
        let task: Task = decode(Collection::Tasks, record)?;
        self.state.tasks.upsert(task.clone());

        info!(
            "event=task_create module=service status=ok task_id={} recurring={}",
            task.id,
            task.is_recurring()
        );
        self.publish_changed(&[Collection::Tasks, Collection::Goals]);
        self.notify_success("Task created!");
        Ok(task)
    }

    /// Replaces a task's editable fields, recurrence included.
    ///
    /// The row is re-read afterwards for fresh joins; if that read fails the
    /// locally merged copy stands. Returns `None` for unknown ids.
    pub async fn update_task(
        &mut self,
        id: EntityId,
        draft: &TaskDraft,
    ) -> ServiceResult<Option<Task>> {
        if !self.state.tasks.contains(id) {
            debug!("event=task_update module=service status=skipped reason=not_found task_id={id}");
            return Ok(None);
        }
        let draft = self.validate_task(draft)?;

        if let Err(err) = self
            .store
            .update(Collection::Tasks, id, draft.to_record())
            .await
        {
            return Err(self.remote_failure("task_update", "Failed to save task", err));
        }

        let Some(task) = self.state.tasks.find_mut(id) else {
            return Ok(None);
        };
        task.apply_draft(&draft);
        self.refresh_task(id).await;

        info!("event=task_update module=service status=ok task_id={id}");
        self.publish_changed(&[Collection::Tasks, Collection::Goals]);
        self.notify_success("Task updated!");
        Ok(self.state.tasks.find(id).cloned())
    }

    /// Flips completion in the cache first, then writes it.
    ///
    /// `completed_at` moves with the flag. On failure both fields revert,
    /// provided the task is still cached.
    pub async fn toggle_task_completion(&mut self, id: EntityId) -> ServiceResult<Option<Task>> {
        let Some(task) = self.state.tasks.find_mut(id) else {
            debug!("event=task_toggle module=service status=skipped reason=not_found task_id={id}");
            return Ok(None);
        };
        let previous = (task.is_completed, task.completed_at);
        task.set_completed(!task.is_completed, Utc::now());
        let completed = task.is_completed;
        let patch = json!({
            "is_completed": task.is_completed,
            "completed_at": task.completed_at,
        });
        self.publish_changed(&[Collection::Tasks, Collection::Goals]);

        if let Err(err) = self.store.update(Collection::Tasks, id, patch).await {
            match self.state.tasks.find_mut(id) {
                Some(task) => {
                    task.is_completed = previous.0;
                    task.completed_at = previous.1;
                    self.publish_changed(&[Collection::Tasks, Collection::Goals]);
                }
                None => warn!(
                    "event=task_toggle module=service status=rollback_skipped reason=not_found task_id={id}"
                ),
            }
            return Err(self.remote_failure("task_toggle", "Failed to update task", err));
        }

        info!("event=task_toggle module=service status=ok task_id={id} completed={completed}");
        if completed {
            self.notify_success("Task completed!");
        }
        Ok(self.state.tasks.find(id).cloned())
    }

    /// Tasks have no dependents, so the impact only names the task.
    pub fn task_delete_impact(&self, id: EntityId) -> Option<DeletionImpact> {
        let task = self.state.tasks.find(id)?;
        Some(DeletionImpact {
            collection: Collection::Tasks,
            name: task.title.clone(),
            tasks: 0,
            goals: 0,
        })
    }

    /// Soft-deletes a task once `confirm` accepts; it leaves the cache but
    /// stays in the store as `deleted`.
    pub async fn delete_task(
        &mut self,
        id: EntityId,
        confirm: impl FnOnce(&DeletionImpact) -> bool,
    ) -> ServiceResult<ActionOutcome> {
        let Some(impact) = self.task_delete_impact(id) else {
            return Ok(ActionOutcome::NotFound);
        };
        if !confirm(&impact) {
            return Ok(ActionOutcome::Cancelled);
        }

        if let Err(err) = self
            .store
            .update(Collection::Tasks, id, json!({ "status": "deleted" }))
            .await
        {
            return Err(self.remote_failure("task_delete", "Failed to delete task", err));
        }

        self.state.tasks.remove(id);

        info!("event=task_delete module=service status=ok task_id={id}");
        self.publish_changed(&[Collection::Tasks, Collection::Goals]);
        self.notify_success("Task deleted");
        Ok(ActionOutcome::Applied)
    }

    async fn refresh_task(&mut self, id: EntityId) {
        let records = match self
            .store
            .select(Collection::Tasks, &RecordFilter::by_id(id))
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!("event=task_refetch module=service status=error task_id={id} error={err}");
                return;
            }
        };
        let Some(record) = records.into_iter().next() else {
            return;
        };
        match decode::<Task>(Collection::Tasks, record) {
            Ok(fresh) if !self.state.tasks.contains(id) => {
                debug!("event=task_refetch module=service status=skipped reason=not_found task_id={}", fresh.id);
            }
            Ok(fresh) if fresh.status == TaskStatus::Deleted => {
                self.state.tasks.remove(id);
            }
            Ok(fresh) => {
                self.state.tasks.upsert(fresh);
            }
            Err(err) => {
                warn!("event=task_refetch module=service status=error task_id={id} error={err}");
            }
        }
    }

    fn validate_task(&self, draft: &TaskDraft) -> ServiceResult<TaskDraft> {
        let draft = draft
            .normalized()
            .map_err(|err| self.rejected("task_save", err))?;
        if let Some(category_id) = draft.category_id {
            if !self.state.categories.contains(category_id) {
                return Err(self.rejected(
                    "task_save",
                    ValidationError::MissingSelection("category"),
                ));
            }
        }
        if let Some(goal_id) = draft.goal_id {
            if !self.state.goals.contains(goal_id) {
                return Err(self.rejected("task_save", ValidationError::MissingSelection("goal")));
            }
        }
        Ok(draft)
    }
}
