//! Property tests for the nightly check over generated moves.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use uuid::Uuid;

use common::{launch_start, protocol_at};
use taskpress::adapters::memory::InMemoryMoveRepository;
use taskpress::domain::models::{
    CompressionResult, MoveStatus, Plan, ProtocolConfig, Task, TaskKind, TaskStatus,
};
use taskpress::domain::ports::MoveRepository;
use taskpress::services::FailureTracker;

#[derive(Debug, Clone)]
struct TaskShape {
    day: u32,
    kind: TaskKind,
    depends_on: Option<usize>,
    completed: bool,
}

fn kind_strategy() -> impl Strategy<Value = TaskKind> {
    prop_oneof![
        Just(TaskKind::Pillar),
        Just(TaskKind::Cluster),
        Just(TaskKind::Support),
    ]
}

fn task_strategy() -> impl Strategy<Value = TaskShape> {
    (0u32..16, kind_strategy(), proptest::option::of(0usize..16), proptest::bool::weighted(0.3)).prop_map(
        |(day, kind, depends_on, completed)| TaskShape {
            day,
            kind,
            depends_on,
            completed,
        },
    )
}

fn move_strategy() -> impl Strategy<Value = (u32, Vec<TaskShape>, u64)> {
    (1u32..=7, proptest::collection::vec(task_strategy(), 1..12), 0u64..10)
}

/// Build a well-formed move: days inside the duration, dependencies only on
/// strictly earlier days.
fn build_plan(duration: u32, mut shapes: Vec<TaskShape>) -> Plan {
    for shape in &mut shapes {
        shape.day = 1 + shape.day % duration;
    }
    shapes.sort_by_key(|s| s.day);

    let mut plan = Plan::new("Generated", launch_start(), duration);
    let mut ids: Vec<(Uuid, u32)> = Vec::with_capacity(shapes.len());
    for (i, shape) in shapes.iter().enumerate() {
        let mut task = Task::new(format!("Task {i}"), shape.kind, shape.day);
        if let Some(choice) = shape.depends_on.filter(|_| i > 0) {
            let (dep_id, dep_day) = ids[choice % i];
            if dep_day < shape.day {
                task = task.with_dependency(dep_id);
            }
        }
        let id = plan.add_task(task).unwrap();
        if shape.completed {
            plan.complete_task(id, launch_start().and_time(chrono::NaiveTime::MIN).and_utc())
                .unwrap();
        }
        ids.push((id, shape.day));
    }
    plan
}

fn as_of(offset: u64) -> NaiveDate {
    launch_start().checked_add_days(Days::new(offset)).unwrap()
}

fn evaluate(plan: &mut Plan, as_of: NaiveDate) -> CompressionResult {
    let repo = Arc::new(InMemoryMoveRepository::new());
    protocol_at(repo, as_of, &ProtocolConfig::default())
        .evaluate(plan, as_of)
        .unwrap()
}

proptest! {
    /// A second run for the same night finds nothing left to do.
    #[test]
    fn prop_rerun_is_idempotent((duration, shapes, offset) in move_strategy()) {
        let mut plan = build_plan(duration, shapes);
        let as_of = as_of(offset);

        evaluate(&mut plan, as_of);
        let after_first = plan.clone();
        let second = evaluate(&mut plan, as_of);

        prop_assert_eq!(second, CompressionResult::NoAction);
        prop_assert_eq!(plan, after_first);
    }

    /// Every compressed task is listed by exactly one merged task, and merged
    /// tasks carry no dependency.
    #[test]
    fn prop_compressed_tasks_have_one_merge((duration, shapes, offset) in move_strategy()) {
        let mut plan = build_plan(duration, shapes);
        evaluate(&mut plan, as_of(offset));

        let mut owners: HashMap<Uuid, usize> = HashMap::new();
        for merged in plan.tasks.iter().filter(|t| !t.merged_from.is_empty()) {
            prop_assert_eq!(merged.dependency_id, None);
            prop_assert_eq!(merged.kind, TaskKind::Pillar);
            for &original in &merged.merged_from {
                *owners.entry(original).or_default() += 1;
            }
        }
        for task in plan.tasks.iter().filter(|t| t.status == TaskStatus::Compressed) {
            prop_assert_eq!(owners.get(&task.id).copied(), Some(1), "task {}", task.title);
        }
    }

    /// Pillar tasks are compressed or left overdue, never dropped.
    #[test]
    fn prop_pillars_are_never_abandoned((duration, shapes, offset) in move_strategy()) {
        let mut plan = build_plan(duration, shapes);
        evaluate(&mut plan, as_of(offset));

        for task in plan.tasks.iter().filter(|t| t.kind == TaskKind::Pillar) {
            prop_assert_ne!(task.status, TaskStatus::Abandoned);
        }
    }

    /// The move aborts exactly when the failure streak reaches the threshold.
    #[test]
    fn prop_abort_iff_threshold((duration, shapes, offset) in move_strategy()) {
        let mut plan = build_plan(duration, shapes);
        let as_of = as_of(offset);
        let result = evaluate(&mut plan, as_of);

        let streak = FailureTracker::default().count_consecutive_failures(&plan, plan.current_day(as_of));
        prop_assert_eq!(plan.status == MoveStatus::Aborted, streak >= 3);
        prop_assert_eq!(result.is_aborted(), streak >= 3);
    }

    /// Nothing due before the evaluation date is left scheduled.
    #[test]
    fn prop_past_days_are_resolved_or_overdue((duration, shapes, offset) in move_strategy()) {
        let mut plan = build_plan(duration, shapes);
        let as_of = as_of(offset);
        evaluate(&mut plan, as_of);

        for task in &plan.tasks {
            if task.due_date < as_of {
                prop_assert_ne!(task.status, TaskStatus::Scheduled, "task {}", task.title);
            }
        }
    }

    /// Persisting between runs saves only when something changed.
    #[test]
    fn prop_repository_saves_once_per_change((duration, shapes, offset) in move_strategy()) {
        let plan = build_plan(duration, shapes);
        let as_of = as_of(offset);

        tokio_test::block_on(async {
            let repo = Arc::new(InMemoryMoveRepository::new());
            repo.insert(&plan).await.unwrap();
            let protocol = protocol_at(repo.clone(), as_of, &ProtocolConfig::default());

            protocol.run_nightly_check(plan.id, as_of).await.unwrap();
            let saves = repo.save_count();
            let stored = repo.load(plan.id).await.unwrap();
            prop_assert_eq!(saves, usize::from(stored != plan));

            protocol.run_nightly_check(plan.id, as_of).await.unwrap();
            prop_assert_eq!(repo.save_count(), saves);
            Ok(())
        })?;
    }
}
