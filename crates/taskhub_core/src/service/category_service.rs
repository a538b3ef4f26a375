//! Category create/update/delete (store first, then cache).

use super::coordinator::{decode, ActionOutcome, Coordinator, DeletionImpact, ServiceResult};
use crate::model::category::{Category, CategoryDraft};
use crate::model::{EntityId, ValidationError};
use crate::store::{Collection, RecordStore};
use log::{debug, info};

impl<S: RecordStore> Coordinator<S> {
    /// Creates a category after the duplicate-name guard passes.
    pub async fn create_category(&mut self, draft: &CategoryDraft) -> ServiceResult<Category> {
        let draft = self.validate_category(draft, None)?;

        let record = match self
            .store
            .insert(Collection::Categories, draft.to_record())
            .await
        {
            Ok(record) => record,
            Err(err) => {
                return Err(self.remote_failure("category_create", "Failed to save category", err))
            }
        };
        let category: Category = decode(Collection::Categories, record)?;
        self.state.categories.upsert(category.clone());

        info!(
            "event=category_create module=service status=ok category_id={}",
            category.id
        );
        // Goal colors resolve through category names, so goals re-render too.
        self.publish_changed(&Collection::ALL);
        self.notify_success("Category created successfully");
        Ok(category)
    }

    /// Renames or recolors a category. Returns `None` for unknown ids.
    pub async fn update_category(
        &mut self,
        id: EntityId,
        draft: &CategoryDraft,
    ) -> ServiceResult<Option<Category>> {
        if !self.state.categories.contains(id) {
            debug!("event=category_update module=service status=skipped reason=not_found category_id={id}");
            return Ok(None);
        }
        let draft = self.validate_category(draft, Some(id))?;

        if let Err(err) = self
            .store
            .update(Collection::Categories, id, draft.to_record())
            .await
        {
            return Err(self.remote_failure("category_update", "Failed to save category", err));
        }

        let Some(category) = self.state.categories.find_mut(id) else {
            return Ok(None);
        };
        category.name = draft.name;
        category.color_hex = draft.color_hex;
        let updated = category.clone();
        self.state.refresh_category_join(&updated);

        info!("event=category_update module=service status=ok category_id={id}");
        self.publish_changed(&Collection::ALL);
        self.notify_success("Category updated successfully");
        Ok(Some(updated))
    }

    /// Counts what deleting `id` would unlink.
    pub fn category_delete_impact(&self, id: EntityId) -> Option<DeletionImpact> {
        let category = self.state.categories.find(id)?;
        Some(DeletionImpact {
            collection: Collection::Categories,
            name: category.name.clone(),
            tasks: self.state.tasks_in_category(id),
            goals: self.state.goals_colored_by(id),
        })
    }

    /// Deletes a category once `confirm` accepts the impact.
    ///
    /// The store nulls task references; the cache mirrors that locally.
    pub async fn delete_category(
        &mut self,
        id: EntityId,
        confirm: impl FnOnce(&DeletionImpact) -> bool,
    ) -> ServiceResult<ActionOutcome> {
        let Some(impact) = self.category_delete_impact(id) else {
            return Ok(ActionOutcome::NotFound);
        };
        if !confirm(&impact) {
            return Ok(ActionOutcome::Cancelled);
        }

        if let Err(err) = self.store.delete(Collection::Categories, id).await {
            return Err(self.remote_failure("category_delete", "Failed to delete category", err));
        }

        self.state.categories.remove(id);
        let unlinked = self.state.unlink_category(id);

        info!(
            "event=category_delete module=service status=ok category_id={id} unlinked_tasks={unlinked}"
        );
        self.publish_changed(&Collection::ALL);
        self.notify_success("Category deleted successfully");
        Ok(ActionOutcome::Applied)
    }

    fn validate_category(
        &self,
        draft: &CategoryDraft,
        editing: Option<EntityId>,
    ) -> ServiceResult<CategoryDraft> {
        let draft = draft
            .normalized()
            .map_err(|err| self.rejected("category_save", err))?;

        let duplicate = self
            .state
            .categories
            .all()
            .any(|category| Some(category.id) != editing && category.has_name(&draft.name));
        if duplicate {
            return Err(self.rejected(
                "category_save",
                ValidationError::DuplicateCategoryName(draft.name),
            ));
        }
        Ok(draft)
    }
}
