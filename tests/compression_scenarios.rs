//! End-to-end nightly check scenarios against the in-memory repository.

mod common;

use std::sync::Arc;

use common::{complete, launch_plan, night_after, protocol_at, setup_test_logging};
use taskpress::adapters::memory::InMemoryMoveRepository;
use taskpress::domain::models::{
    CompressionActionKind, CompressionResult, MoveStatus, Plan, ProtocolConfig, Recommendation, RecoveryOption, Task,
    TaskKind, TaskStatus,
};
use taskpress::domain::ports::MoveRepository;
use taskpress::domain::DomainError;

async fn stored(repo: &InMemoryMoveRepository, plan: &Plan) -> Plan {
    repo.load(plan.id).await.unwrap()
}

#[tokio::test]
async fn test_missed_pillar_merges_into_dependent() {
    setup_test_logging();
    let (mut plan, ids) = launch_plan();
    complete(&mut plan, &[ids.offer, ids.landing_page]);
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(3);
    let result = protocol_at(repo.clone(), as_of, &ProtocolConfig::default())
        .run_nightly_check(plan.id, as_of)
        .await
        .unwrap();

    let CompressionResult::CompressionApplied { actions } = result else {
        panic!("expected compression, got {result:?}");
    };
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, CompressionActionKind::Compressed);
    let merged_id = actions[0].merged_task_id.unwrap();

    let after = stored(&repo, &plan).await;
    assert_eq!(after.status, MoveStatus::Active);
    assert_eq!(after.task(ids.create_teaser).unwrap().status, TaskStatus::Compressed);
    assert_eq!(after.task(ids.post_teaser).unwrap().status, TaskStatus::Compressed);

    let merged = after.task(merged_id).unwrap();
    assert_eq!(merged.title, "Create Teaser Video + Post Teaser Video");
    assert_eq!(merged.kind, TaskKind::Pillar);
    assert_eq!(merged.day_number, 4);
    assert_eq!(merged.status, TaskStatus::Scheduled);
    assert_eq!(merged.dependency_id, None);
    assert_eq!(merged.merged_from, vec![ids.create_teaser, ids.post_teaser]);
    assert_eq!(merged.due_date, night_after(3));
    assert_eq!(merged.description, "Film and edit\n\nPublish on every channel");

    // The review now builds on the merged task.
    assert_eq!(after.task(ids.launch_review).unwrap().dependency_id, Some(merged_id));
    assert_eq!(after.compression_log.len(), 1);
}

#[tokio::test]
async fn test_missed_cluster_task_is_dropped() {
    let (mut plan, ids) = launch_plan();
    complete(
        &mut plan,
        &[ids.offer, ids.landing_page, ids.create_teaser, ids.post_teaser],
    );
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(4);
    let result = protocol_at(repo.clone(), as_of, &ProtocolConfig::default())
        .run_nightly_check(plan.id, as_of)
        .await
        .unwrap();

    assert_eq!(result.as_str(), "compression_applied");
    assert_eq!(result.actions().len(), 1);
    assert_eq!(result.actions()[0].action, CompressionActionKind::Abandoned);
    assert_eq!(result.actions()[0].task_ids, vec![ids.twitter_thread]);

    let after = stored(&repo, &plan).await;
    assert_eq!(after.task(ids.twitter_thread).unwrap().status, TaskStatus::Abandoned);
    assert_eq!(after.tasks.len(), plan.tasks.len());
    for task in after.tasks.iter().filter(|t| t.id != ids.twitter_thread) {
        assert_eq!(Some(task), plan.task(task.id), "task '{}' changed", task.title);
    }
}

#[tokio::test]
async fn test_three_failed_days_abort_the_move() {
    let start = common::launch_start();
    let mut plan = Plan::new("Daily Writing", start, 7);
    plan.add_task(Task::new("Outline", TaskKind::Support, 1)).unwrap();
    plan.add_task(Task::new("Research", TaskKind::Cluster, 2)).unwrap();
    let essay = plan.add_task(Task::new("Essay", TaskKind::Pillar, 3)).unwrap();
    plan.add_task(Task::new("Edit", TaskKind::Pillar, 5)).unwrap();
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(3);
    let protocol = protocol_at(repo.clone(), as_of, &ProtocolConfig::default());
    let result = protocol.run_nightly_check(plan.id, as_of).await.unwrap();

    let CompressionResult::MoveAborted { actions, payload } = result else {
        panic!("expected abort, got {result:?}");
    };
    assert_eq!(actions.len(), 2, "both optional tasks were dropped first");
    assert_eq!(payload.consecutive_failures, 3);
    assert_eq!(
        payload.options,
        vec![
            RecoveryOption::RestartMove,
            RecoveryOption::DowngradeIntensity,
            RecoveryOption::AbortCampaign
        ]
    );
    assert!(payload.message.contains("You have missed 3 days"));
    assert!(payload.message.contains("'Daily Writing' strategy is broken"));

    let after = stored(&repo, &plan).await;
    assert_eq!(after.status, MoveStatus::Aborted);
    assert_eq!(after.task(essay).unwrap().status, TaskStatus::Overdue);
    assert_eq!(after.compression_log.by_action(CompressionActionKind::Aborted).count(), 1);

    // An aborted move takes no further changes.
    let err = protocol.complete_task(plan.id, essay).await.unwrap_err();
    assert!(matches!(err, DomainError::MoveNotActive { status: MoveStatus::Aborted, .. }));
    let rerun = protocol.run_nightly_check(plan.id, night_after(4)).await.unwrap();
    assert_eq!(rerun, CompressionResult::NoAction);
}

#[tokio::test]
async fn test_non_viable_merge_is_recorded_and_left_overdue() {
    let (mut plan, ids) = launch_plan();
    plan.task_mut(ids.create_teaser).unwrap().produces = Some("teaser_video".to_string());
    plan.task_mut(ids.post_teaser).unwrap().requires = Some("teaser_video".to_string());
    complete(&mut plan, &[ids.offer, ids.landing_page]);
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(3);
    let result = protocol_at(repo.clone(), as_of, &ProtocolConfig::default())
        .run_nightly_check(plan.id, as_of)
        .await
        .unwrap();

    let actions = result.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, CompressionActionKind::FailedCompression);
    assert_eq!(actions[0].recommendation, Some(Recommendation::RescheduleMove));
    assert_eq!(actions[0].merged_task_id, None);
    assert!(actions[0].rationale.contains("teaser_video"));

    let after = stored(&repo, &plan).await;
    assert_eq!(after.status, MoveStatus::Active);
    assert_eq!(after.task(ids.create_teaser).unwrap().status, TaskStatus::Overdue);
    assert_eq!(after.task(ids.post_teaser).unwrap().status, TaskStatus::Scheduled);
    assert_eq!(after.tasks.len(), plan.tasks.len());
}

#[tokio::test]
async fn test_non_viable_merge_is_recorded_each_night() {
    let mut plan = Plan::new("Teaser", common::launch_start(), 7);
    let create = plan
        .add_task(Task::new("Create Teaser Video", TaskKind::Pillar, 3).producing("teaser_video"))
        .unwrap();
    let post = plan
        .add_task(
            Task::new("Post Teaser Video", TaskKind::Pillar, 6)
                .with_dependency(create)
                .requiring("teaser_video"),
        )
        .unwrap();
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();
    let config = ProtocolConfig::default();

    for day in [3, 4] {
        let result = protocol_at(repo.clone(), night_after(day), &config)
            .run_nightly_check(plan.id, night_after(day))
            .await
            .unwrap();
        let actions = result.actions();
        assert_eq!(actions.len(), 1, "night {day}");
        assert_eq!(actions[0].action, CompressionActionKind::FailedCompression);
        assert_eq!(actions[0].recommendation, Some(Recommendation::RescheduleMove));
    }

    let after = stored(&repo, &plan).await;
    let nights: Vec<u32> = after
        .compression_log
        .by_action(CompressionActionKind::FailedCompression)
        .map(|r| r.night)
        .collect();
    assert_eq!(nights, vec![3, 4]);
    assert_eq!(after.task(create).unwrap().status, TaskStatus::Overdue);
    assert_eq!(after.task(post).unwrap().status, TaskStatus::Scheduled);
}

#[tokio::test]
async fn test_same_day_tag_makes_merge_viable() {
    let (mut plan, ids) = launch_plan();
    plan.task_mut(ids.create_teaser).unwrap().produces = Some("teaser_video".to_string());
    plan.task_mut(ids.post_teaser).unwrap().requires = Some("teaser_video".to_string());
    complete(&mut plan, &[ids.offer, ids.landing_page]);
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let config = ProtocolConfig {
        same_day_tags: vec!["teaser_video".to_string()],
        ..ProtocolConfig::default()
    };
    let as_of = night_after(3);
    let result = protocol_at(repo, as_of, &config)
        .run_nightly_check(plan.id, as_of)
        .await
        .unwrap();

    assert_eq!(result.actions()[0].action, CompressionActionKind::Compressed);
}

#[tokio::test]
async fn test_rerun_for_same_night_changes_nothing() {
    let (mut plan, ids) = launch_plan();
    complete(&mut plan, &[ids.offer]);
    plan.task_mut(ids.create_teaser).unwrap().produces = Some("teaser_video".to_string());
    plan.task_mut(ids.post_teaser).unwrap().requires = Some("teaser_video".to_string());
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(3);
    let protocol = protocol_at(repo.clone(), as_of, &ProtocolConfig::default());

    let first = protocol.run_nightly_check(plan.id, as_of).await.unwrap();
    assert_eq!(first.actions().len(), 2);
    let after_first = stored(&repo, &plan).await;
    let saves = repo.save_count();

    let second = protocol.run_nightly_check(plan.id, as_of).await.unwrap();
    assert_eq!(second, CompressionResult::NoAction);
    assert_eq!(stored(&repo, &plan).await, after_first);
    assert_eq!(repo.save_count(), saves);
}

#[tokio::test]
async fn test_merged_task_missed_later_is_compressed_again() {
    let (mut plan, ids) = launch_plan();
    complete(&mut plan, &[ids.offer, ids.landing_page]);
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();
    let config = ProtocolConfig::default();

    let first = protocol_at(repo.clone(), night_after(3), &config)
        .run_nightly_check(plan.id, night_after(3))
        .await
        .unwrap();
    let merged_id = first.actions()[0].merged_task_id.unwrap();

    // Day 4 and 5 pass without progress: the merge and both clusters are missed.
    let second = protocol_at(repo.clone(), night_after(5), &config)
        .run_nightly_check(plan.id, night_after(5))
        .await
        .unwrap();

    let count = |kind: CompressionActionKind| second.actions().iter().filter(|a| a.action == kind).count();
    assert_eq!(count(CompressionActionKind::Compressed), 1);
    assert_eq!(count(CompressionActionKind::Abandoned), 2);

    let after = stored(&repo, &plan).await;
    let remerged_id = second.actions().iter().find_map(|a| a.merged_task_id).unwrap();
    let remerged = after.task(remerged_id).unwrap();
    assert_eq!(remerged.merged_from, vec![merged_id, ids.launch_review]);
    assert_eq!(remerged.day_number, 7);
    assert_eq!(after.task(merged_id).unwrap().status, TaskStatus::Compressed);
    assert_eq!(after.status, MoveStatus::Active);
}

#[tokio::test]
async fn test_empty_day_does_not_extend_streak() {
    let start = common::launch_start();
    let mut plan = Plan::new("Gaps", start, 6);
    plan.add_task(Task::new("One", TaskKind::Support, 1)).unwrap();
    plan.add_task(Task::new("Two", TaskKind::Support, 2)).unwrap();
    plan.add_task(Task::new("Four", TaskKind::Support, 4)).unwrap();
    plan.add_task(Task::new("Six", TaskKind::Pillar, 6)).unwrap();
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(4);
    let result = protocol_at(repo.clone(), as_of, &ProtocolConfig::default())
        .run_nightly_check(plan.id, as_of)
        .await
        .unwrap();

    assert!(!result.is_aborted());
    assert_eq!(result.actions().len(), 3);
    assert_eq!(stored(&repo, &plan).await.status, MoveStatus::Active);
}

#[tokio::test]
async fn test_first_run_after_move_end_does_not_abort() {
    let start = common::launch_start();
    let mut plan = Plan::new("Sprint", start, 3);
    for day in 1..=3 {
        plan.add_task(Task::new(format!("Day {day}"), TaskKind::Cluster, day)).unwrap();
    }
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let as_of = night_after(6);
    let result = protocol_at(repo.clone(), as_of, &ProtocolConfig::default())
        .run_nightly_check(plan.id, as_of)
        .await
        .unwrap();

    assert!(!result.is_aborted());
    assert_eq!(result.actions().len(), 3);
    let after = stored(&repo, &plan).await;
    assert_eq!(after.status, MoveStatus::Completed);
    assert_eq!(after.compression_log.by_action(CompressionActionKind::Aborted).count(), 0);
}

#[tokio::test]
async fn test_abort_follows_configured_threshold() {
    let start = common::launch_start();
    let mut plan = Plan::new("Sprint", start, 5);
    for day in 1..=3 {
        plan.add_task(Task::new(format!("Day {day}"), TaskKind::Cluster, day)).unwrap();
    }
    let repo = Arc::new(InMemoryMoveRepository::new());
    repo.insert(&plan).await.unwrap();

    let lenient = ProtocolConfig {
        failure_threshold: 4,
        ..ProtocolConfig::default()
    };
    let result = protocol_at(repo.clone(), night_after(3), &lenient)
        .run_nightly_check(plan.id, night_after(3))
        .await
        .unwrap();
    assert!(!result.is_aborted());
    assert_eq!(stored(&repo, &plan).await.status, MoveStatus::Active);

    let strict = ProtocolConfig {
        failure_threshold: 3,
        ..ProtocolConfig::default()
    };
    let result = protocol_at(repo.clone(), night_after(3), &strict)
        .run_nightly_check(plan.id, night_after(3))
        .await
        .unwrap();
    assert!(result.is_aborted());
    assert!(result.actions().is_empty(), "tasks were dropped by the first run");
    assert_eq!(stored(&repo, &plan).await.status, MoveStatus::Aborted);
}
