mod common;

use common::{loaded_hub, stored, Op, ScriptedStore};
use serde_json::json;
use taskhub_core::view::{active_goals, goal_cards, goal_progress};
use taskhub_core::{
    ActionOutcome, Collection, Coordinator, EntityId, Goal, GoalDrag, GoalDraft, GoalKind,
    GoalStatus, ReorderOutcome, ServiceError, TaskDraft,
};
use chrono::NaiveDate;

async fn three_goals(hub: &mut Coordinator<ScriptedStore>) -> (Goal, Goal, Goal) {
    let a = hub
        .create_goal(&GoalDraft::new("Learn Spanish", GoalKind::Learning))
        .await
        .unwrap();
    let b = hub
        .create_goal(&GoalDraft::new("Run a marathon", GoalKind::Health))
        .await
        .unwrap();
    let c = hub
        .create_goal(&GoalDraft::new("Visit Japan", GoalKind::Travel))
        .await
        .unwrap();
    (a, b, c)
}

fn active_names(hub: &Coordinator<ScriptedStore>) -> Vec<String> {
    active_goals(hub.state())
        .into_iter()
        .map(|goal| goal.name.clone())
        .collect()
}

fn cached_order(hub: &Coordinator<ScriptedStore>, id: EntityId) -> i64 {
    hub.state().goals.find(id).unwrap().order
}

#[tokio::test]
async fn new_goals_are_active_and_appended() {
    let mut hub = loaded_hub().await;
    let (a, b, c) = three_goals(&mut hub).await;

    assert_eq!((a.order, b.order, c.order), (1, 2, 3));
    assert!(a.is_active());
    assert_eq!(
        active_names(&hub),
        ["Learn Spanish", "Run a marathon", "Visit Japan"]
    );
}

#[tokio::test]
async fn dragging_places_goal_immediately_before_target() {
    let mut hub = loaded_hub().await;
    let (a, b, c) = three_goals(&mut hub).await;

    let request = GoalDrag::start(a.id).drop_on(c.id).unwrap();
    let outcome = hub.reorder_goals(request).await.unwrap();

    // A leaves index 0, so only A and B change.
    assert_eq!(outcome, ReorderOutcome::Reordered { persisted: 2 });
    assert_eq!(
        active_names(&hub),
        ["Run a marathon", "Learn Spanish", "Visit Japan"]
    );
    assert_eq!(
        (cached_order(&hub, a.id), cached_order(&hub, b.id), cached_order(&hub, c.id)),
        (2, 1, 3)
    );
    assert_eq!(stored(&hub, Collection::Goals, a.id).await["user_order"], json!(2));
    assert_eq!(stored(&hub, Collection::Goals, b.id).await["user_order"], json!(1));

    let request = GoalDrag::start(c.id).drop_on(b.id).unwrap();
    hub.reorder_goals(request).await.unwrap();
    assert_eq!(
        active_names(&hub),
        ["Visit Japan", "Run a marathon", "Learn Spanish"]
    );
    assert_eq!(active_goals(hub.state()).len(), 3);
}

#[tokio::test]
async fn reorder_with_nothing_to_move_writes_nothing() {
    let mut hub = loaded_hub().await;
    let (a, b, _) = three_goals(&mut hub).await;
    let writes_before = hub.store().writes();

    let request = GoalDrag::start(a.id).drop_on(b.id).unwrap();
    assert_eq!(hub.reorder_goals(request).await.unwrap(), ReorderOutcome::Unchanged);
    assert_eq!(hub.store().writes(), writes_before);
}

fn assert_orders_unique(hub: &Coordinator<ScriptedStore>) {
    let mut orders: Vec<i64> = active_goals(hub.state())
        .into_iter()
        .map(|goal| goal.order)
        .collect();
    let count = orders.len();
    orders.dedup();
    assert_eq!(orders.len(), count, "duplicate goal orders: {orders:?}");
}

async fn assert_cache_matches_store(hub: &Coordinator<ScriptedStore>, goals: &[&Goal]) {
    for goal in goals {
        let row = stored(hub, Collection::Goals, goal.id).await;
        assert_eq!(json!(cached_order(hub, goal.id)), row["user_order"]);
    }
}

#[tokio::test]
async fn failed_reorder_keeps_cache_in_step_with_store() {
    let mut hub = loaded_hub().await;
    let (a, b, c) = three_goals(&mut hub).await;
    // A is parked below the list first; the write moving C to the top fails.
    hub.store().fail_after(Op::Update, Collection::Goals, 1);

    let request = GoalDrag::start(c.id).drop_on(a.id).unwrap();
    let err = hub.reorder_goals(request).await.unwrap_err();
    match err {
        ServiceError::PartialReorder {
            failed, persisted, ..
        } => {
            assert_eq!(failed, c.id);
            assert_eq!(persisted, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_cache_matches_store(&hub, &[&a, &b, &c]).await;
    assert_orders_unique(&hub);
    assert_eq!(
        active_names(&hub),
        ["Learn Spanish", "Run a marathon", "Visit Japan"]
    );

    // The next successful drag renumbers everything to 1..N.
    let request = GoalDrag::start(c.id).drop_on(a.id).unwrap();
    hub.reorder_goals(request).await.unwrap();
    assert_cache_matches_store(&hub, &[&a, &b, &c]).await;
    assert_eq!(
        (cached_order(&hub, c.id), cached_order(&hub, a.id), cached_order(&hub, b.id)),
        (1, 2, 3)
    );
}

#[tokio::test]
async fn reorder_failing_at_any_write_leaves_unique_orders() {
    for skip in 0..4 {
        let mut hub = loaded_hub().await;
        let (a, b, c) = three_goals(&mut hub).await;
        hub.store().fail_after(Op::Update, Collection::Goals, skip);

        let request = GoalDrag::start(c.id).drop_on(a.id).unwrap();
        let err = hub.reorder_goals(request).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::PartialReorder { persisted, .. } if persisted == skip),
            "{err}"
        );
        assert_cache_matches_store(&hub, &[&a, &b, &c]).await;
        assert_orders_unique(&hub);
    }
}

#[tokio::test]
async fn archive_requires_confirmation_and_is_terminal() {
    let mut hub = loaded_hub().await;
    let (a, _, _) = three_goals(&mut hub).await;

    let outcome = hub.archive_goal(a.id, |_| false).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Cancelled);
    assert!(hub.state().goals.find(a.id).unwrap().is_active());

    let outcome = hub
        .archive_goal(a.id, |goal| goal.name == "Learn Spanish")
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(hub.state().goals.find(a.id).unwrap().status, GoalStatus::Archived);
    assert_eq!(stored(&hub, Collection::Goals, a.id).await["status"], json!("archived"));
    assert_eq!(active_names(&hub), ["Run a marathon", "Visit Japan"]);

    let outcome = hub.archive_goal(a.id, |_| true).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Unchanged);
}

#[tokio::test]
async fn progress_follows_linked_task_completion() {
    let mut hub = loaded_hub().await;
    let goal = hub
        .create_goal(
            &GoalDraft::new("Finish course", GoalKind::Learning)
                .with_due_date(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()),
        )
        .await
        .unwrap();
    let mut tasks = Vec::new();
    for title in ["Module 1", "Module 2", "Module 3"] {
        let task = hub
            .create_task(&TaskDraft::new(title).with_goal(goal.id))
            .await
            .unwrap();
        tasks.push(task.id);
    }
    assert_eq!(goal_progress(hub.state(), goal.id), 0);

    hub.toggle_task_completion(tasks[0]).await.unwrap();
    assert_eq!(goal_progress(hub.state(), goal.id), 33);
    hub.toggle_task_completion(tasks[1]).await.unwrap();
    assert_eq!(goal_progress(hub.state(), goal.id), 67);
    hub.toggle_task_completion(tasks[2]).await.unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let cards = goal_cards(hub.state(), today);
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].progress, 100);
    assert!(cards[0].can_archive);
    assert_eq!(cards[0].due.text, "2 days");
    assert!(!cards[0].due.is_overdue);
}

#[tokio::test]
async fn deleting_a_goal_unlinks_its_tasks() {
    let mut hub = loaded_hub().await;
    let goal = hub
        .create_goal(&GoalDraft::new("Save money", GoalKind::Financial))
        .await
        .unwrap();
    let first = hub
        .create_task(&TaskDraft::new("Open savings account").with_goal(goal.id))
        .await
        .unwrap();
    hub.create_task(&TaskDraft::new("Set budget").with_goal(goal.id))
        .await
        .unwrap();

    let impact = hub.goal_delete_impact(goal.id).unwrap();
    assert_eq!(impact.tasks, 2);
    assert!(impact.message().contains("2 task(s) will be unlinked"));

    let outcome = hub.delete_goal(goal.id, |_| true).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);
    assert!(hub.state().goals.is_empty());
    assert_eq!(hub.state().tasks.len(), 2);
    for task in hub.state().tasks.all() {
        assert_eq!(task.goal_id, None);
        assert_eq!(task.goal, None);
    }
    assert!(stored(&hub, Collection::Tasks, first.id).await["goal_id"].is_null());
}

#[tokio::test]
async fn failed_goal_create_leaves_cache_untouched() {
    let mut hub = loaded_hub().await;
    hub.store().fail_next(Op::Insert, Collection::Goals);

    let err = hub
        .create_goal(&GoalDraft::new("Write a book", GoalKind::Personal))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Remote(_)));
    assert!(hub.state().goals.is_empty());
}
