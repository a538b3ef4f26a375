mod common;

use chrono::NaiveDate;
use common::{loaded_hub, stored, Op};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use taskhub_core::{
    ActionOutcome, CategoryDraft, Collection, Coordinator, GoalDraft, GoalKind, HubEvent, Notice,
    Recurrence, RecurrencePattern, ServiceError, StoreError, TaskDraft, ValidationError,
};
use uuid::Uuid;

fn record_events<S: taskhub_core::RecordStore>(hub: &mut Coordinator<S>) -> Rc<RefCell<Vec<HubEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    hub.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

#[tokio::test]
async fn created_tasks_carry_joins_and_increasing_order() {
    let mut hub = loaded_hub().await;
    let home = hub
        .create_category(&CategoryDraft::new("Home", "#10B981"))
        .await
        .unwrap();
    let goal = hub
        .create_goal(&GoalDraft::new("Tidy house", GoalKind::Personal))
        .await
        .unwrap();
    let events = record_events(&mut hub);

    let first = hub
        .create_task(
            &TaskDraft::new("  Sweep floor  ")
                .with_notes("   ")
                .with_category(home.id)
                .with_goal(goal.id),
        )
        .await
        .unwrap();
    let second = hub.create_task(&TaskDraft::new("Dust shelves")).await.unwrap();

    assert_eq!(first.title, "Sweep floor");
    assert_eq!(first.notes, None);
    assert!(!first.is_completed);
    assert_eq!(first.category.as_ref().map(|c| c.name.as_str()), Some("Home"));
    assert_eq!(first.goal.as_ref().map(|g| g.name.as_str()), Some("Tidy house"));
    assert_eq!((first.order, second.order), (1, 2));
    assert_eq!(hub.state().tasks.len(), 2);
    assert!(events
        .borrow()
        .contains(&HubEvent::Notice(Notice::success("Task created!"))));
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_store() {
    let mut hub = loaded_hub().await;
    let writes_before = hub.store().writes();

    let err = hub.create_task(&TaskDraft::new("   ")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyTitle)));

    let err = hub
        .create_task(&TaskDraft::new("Orphan").with_category(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MissingSelection("category"))
    ));

    let err = hub
        .create_task(&TaskDraft::new("Orphan").with_goal(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MissingSelection("goal"))
    ));

    let weekly = Recurrence {
        pattern: RecurrencePattern::Weekly { day_of_week: 9 },
        interval: 1,
        ends_on: None,
    };
    let err = hub
        .create_task(&TaskDraft::new("Bins out").with_recurrence(weekly))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidDayOfWeek(9))
    ));

    assert_eq!(hub.store().writes(), writes_before);
    assert!(hub.state().tasks.is_empty());
}

#[tokio::test]
async fn toggle_keeps_flag_and_timestamp_together() {
    let mut hub = loaded_hub().await;
    let task = hub.create_task(&TaskDraft::new("Call mom")).await.unwrap();

    let done = hub.toggle_task_completion(task.id).await.unwrap().unwrap();
    assert!(done.is_completed);
    assert!(done.completed_at.is_some());
    let row = stored(&hub, Collection::Tasks, task.id).await;
    assert_eq!(row["is_completed"], json!(true));
    assert!(row["completed_at"].is_string());

    let undone = hub.toggle_task_completion(task.id).await.unwrap().unwrap();
    assert!(!undone.is_completed);
    assert_eq!(undone.completed_at, None);
    let row = stored(&hub, Collection::Tasks, task.id).await;
    assert_eq!(row["is_completed"], json!(false));
    assert!(row["completed_at"].is_null());
}

#[tokio::test]
async fn failed_toggle_restores_previous_state() {
    let mut hub = loaded_hub().await;
    let task = hub.create_task(&TaskDraft::new("Pay rent")).await.unwrap();
    let events = record_events(&mut hub);
    hub.store().fail_next(Op::Update, Collection::Tasks);

    let err = hub.toggle_task_completion(task.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Remote(StoreError::Transport(_))));

    let cached = hub.state().tasks.find(task.id).unwrap();
    assert!(!cached.is_completed);
    assert_eq!(cached.completed_at, None);

    let events = events.borrow();
    let task_changes = events
        .iter()
        .filter(|event| **event == HubEvent::Changed(Collection::Tasks))
        .count();
    // Optimistic apply, then rollback.
    assert_eq!(task_changes, 2);
    assert!(events.contains(&HubEvent::Notice(Notice::error("Failed to update task"))));
}

#[tokio::test]
async fn toggling_an_unknown_task_is_a_no_op() {
    let mut hub = loaded_hub().await;
    assert!(hub
        .toggle_task_completion(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
    assert_eq!(hub.store().writes(), 0);
}

#[tokio::test]
async fn recurrence_survives_enable_disable_and_switch() {
    let mut hub = loaded_hub().await;
    let ends = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
    let weekly = Recurrence::weekly(2, 3).unwrap().ending_on(ends);
    let task = hub
        .create_task(&TaskDraft::new("Water plants").with_recurrence(weekly))
        .await
        .unwrap();

    let row = stored(&hub, Collection::Tasks, task.id).await;
    assert_eq!(row["is_recurring"], json!(true));
    assert_eq!(row["recurrence_type"], json!("weekly"));
    assert_eq!(row["recurrence_interval"], json!(2));
    assert_eq!(row["recurrence_day_of_week"], json!(3));
    assert_eq!(row["recurrence_ends_on"], json!("2026-12-31"));

    hub.update_task(task.id, &TaskDraft::new("Water plants"))
        .await
        .unwrap()
        .unwrap();
    let row = stored(&hub, Collection::Tasks, task.id).await;
    assert_eq!(row["is_recurring"], json!(false));
    for field in [
        "recurrence_type",
        "recurrence_interval",
        "recurrence_day_of_week",
        "recurrence_ends_on",
    ] {
        assert!(row[field].is_null(), "{field} should be cleared");
    }

    let updated = hub
        .update_task(
            task.id,
            &TaskDraft::new("Water plants").with_recurrence(Recurrence::daily(1).unwrap()),
        )
        .await
        .unwrap()
        .unwrap();
    let rule = updated.recurrence.unwrap();
    assert_eq!(rule.pattern, RecurrencePattern::Daily);
    assert_eq!(rule.interval, 1);
    let row = stored(&hub, Collection::Tasks, task.id).await;
    assert_eq!(row["recurrence_type"], json!("daily"));
    assert!(row["recurrence_day_of_week"].is_null());
}

#[tokio::test]
async fn update_refreshes_joins_from_the_store() {
    let mut hub = loaded_hub().await;
    let work = hub
        .create_category(&CategoryDraft::new("Work", "#3B82F6"))
        .await
        .unwrap();
    let home = hub
        .create_category(&CategoryDraft::new("Home", "#10B981"))
        .await
        .unwrap();
    let task = hub
        .create_task(&TaskDraft::new("Plan week").with_category(work.id))
        .await
        .unwrap();

    let updated = hub
        .update_task(task.id, &TaskDraft::new("Plan week").with_category(home.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.category_id, Some(home.id));
    assert_eq!(updated.category.unwrap().name, "Home");
}

#[tokio::test]
async fn updating_an_unknown_task_is_a_no_op() {
    let mut hub = loaded_hub().await;
    let result = hub
        .update_task(Uuid::new_v4(), &TaskDraft::new("Ghost"))
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(hub.store().writes(), 0);
}

#[tokio::test]
async fn delete_is_confirmed_and_soft() {
    let mut hub = loaded_hub().await;
    let task = hub.create_task(&TaskDraft::new("Old chore")).await.unwrap();
    let writes_before = hub.store().writes();

    let outcome = hub.delete_task(task.id, |_| false).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Cancelled);
    assert_eq!(hub.store().writes(), writes_before);
    assert!(hub.state().tasks.contains(task.id));

    let outcome = hub
        .delete_task(task.id, |impact| {
            impact.message() == "Delete task \"Old chore\"?" && !impact.has_dependents()
        })
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);
    assert!(!hub.state().tasks.contains(task.id));
    let row = stored(&hub, Collection::Tasks, task.id).await;
    assert_eq!(row["status"], json!("deleted"));

    hub.load().await.unwrap();
    assert!(hub.state().tasks.is_empty());

    let outcome = hub.delete_task(task.id, |_| true).await.unwrap();
    assert_eq!(outcome, ActionOutcome::NotFound);
}
