//! Goal create/update/archive/delete (store first, then cache).

use super::coordinator::{
    decode, with_fields, ActionOutcome, Coordinator, DeletionImpact, ServiceResult,
};
use crate::model::goal::{Goal, GoalDraft, GoalStatus};
use crate::model::EntityId;
use crate::store::{Collection, RecordStore};
use chrono::Utc;
use log::{debug, info};
use serde_json::json;

impl<S: RecordStore> Coordinator<S> {
    /// Creates an active goal placed after every existing goal.
    pub async fn create_goal(&mut self, draft: &GoalDraft) -> ServiceResult<Goal> {
        let draft = draft
            .normalized()
            .map_err(|err| self.rejected("goal_save", err))?;
        let record = with_fields(
            draft.to_record(),
            [
                ("status", json!("active")),
                ("user_order", json!(self.state.max_goal_order() + 1)),
            ],
        );

        let record = match self.store.insert(Collection::Goals, record).await {
            Ok(record) => record,
            Err(err) => return Err(self.remote_failure("goal_create", "Failed to save goal", err)),
        };
        let goal: Goal = decode(Collection::Goals, record)?;
        self.state.goals.upsert(goal.clone());

        info!(
            "event=goal_create module=service status=ok goal_id={} order={}",
            goal.id, goal.order
        );
        self.publish_changed(&[Collection::Goals]);
        self.notify_success("Goal created successfully");
        Ok(goal)
    }

    /// Replaces a goal's editable fields. Returns `None` for unknown ids.
    pub async fn update_goal(
        &mut self,
        id: EntityId,
        draft: &GoalDraft,
    ) -> ServiceResult<Option<Goal>> {
        if !self.state.goals.contains(id) {
            debug!("event=goal_update module=service status=skipped reason=not_found goal_id={id}");
            return Ok(None);
        }
        let draft = draft
            .normalized()
            .map_err(|err| self.rejected("goal_save", err))?;

        if let Err(err) = self
            .store
            .update(Collection::Goals, id, draft.to_record())
            .await
        {
            return Err(self.remote_failure("goal_update", "Failed to save goal", err));
        }

        let Some(goal) = self.state.goals.find_mut(id) else {
            return Ok(None);
        };
        goal.apply_draft(&draft, Utc::now());
        let updated = goal.clone();
        self.state.refresh_goal_join(&updated);

        info!("event=goal_update module=service status=ok goal_id={id}");
        self.publish_changed(&[Collection::Goals, Collection::Tasks]);
        self.notify_success("Goal updated successfully");
        Ok(Some(updated))
    }

    /// Moves an active goal to `archived` once `confirm` accepts.
    ///
    /// Archived goals never return to active.
    pub async fn archive_goal(
        &mut self,
        id: EntityId,
        confirm: impl FnOnce(&Goal) -> bool,
    ) -> ServiceResult<ActionOutcome> {
        let Some(goal) = self.state.goals.find(id) else {
            return Ok(ActionOutcome::NotFound);
        };
        if !goal.is_active() {
            return Ok(ActionOutcome::Unchanged);
        }
        if !confirm(goal) {
            return Ok(ActionOutcome::Cancelled);
        }

        if let Err(err) = self
            .store
            .update(Collection::Goals, id, json!({ "status": "archived" }))
            .await
        {
            return Err(self.remote_failure("goal_archive", "Failed to complete goal", err));
        }

        if let Some(goal) = self.state.goals.find_mut(id) {
            goal.status = GoalStatus::Archived;
            goal.updated_at = Some(Utc::now());
        }

        info!("event=goal_archive module=service status=ok goal_id={id}");
        self.publish_changed(&[Collection::Goals]);
        self.notify_success("Goal completed! Great work!");
        Ok(ActionOutcome::Applied)
    }

    /// Counts the tasks deleting `id` would unlink.
    pub fn goal_delete_impact(&self, id: EntityId) -> Option<DeletionImpact> {
        let goal = self.state.goals.find(id)?;
        let tasks = self
            .state
            .tasks
            .all()
            .filter(|task| task.goal_id == Some(id))
            .count();
        Some(DeletionImpact {
            collection: Collection::Goals,
            name: goal.name.clone(),
            tasks,
            goals: 0,
        })
    }

    /// Deletes a goal once `confirm` accepts; linked tasks are unlinked,
    /// never deleted.
    pub async fn delete_goal(
        &mut self,
        id: EntityId,
        confirm: impl FnOnce(&DeletionImpact) -> bool,
    ) -> ServiceResult<ActionOutcome> {
        let Some(impact) = self.goal_delete_impact(id) else {
            return Ok(ActionOutcome::NotFound);
        };
        if !confirm(&impact) {
            return Ok(ActionOutcome::Cancelled);
        }

        if let Err(err) = self.store.delete(Collection::Goals, id).await {
            return Err(self.remote_failure("goal_delete", "Failed to delete goal", err));
        }

        self.state.goals.remove(id);
        let unlinked = self.state.unlink_goal(id);

        info!("event=goal_delete module=service status=ok goal_id={id} unlinked_tasks={unlinked}");
        self.publish_changed(&[Collection::Goals, Collection::Tasks]);
        self.notify_success("Goal deleted successfully");
        Ok(ActionOutcome::Applied)
    }
}
