//! Common test utilities for integration tests
//!
//! Provides the product-launch fixture used across scenario, persistence
//! and batch tests.

#![allow(dead_code)]

use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use taskpress::adapters::memory::InMemoryMoveRepository;
use taskpress::domain::models::{Plan, ProtocolConfig, Task, TaskKind};
use taskpress::domain::ports::FixedClock;
use taskpress::services::CompressionProtocol;

/// Day 1 of the launch fixture.
pub fn launch_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// The evaluation date on which tasks of `day` have just been missed.
pub fn night_after(day: u32) -> NaiveDate {
    launch_start()
        .checked_add_days(Days::new(u64::from(day)))
        .unwrap()
}

/// Ids of the launch fixture's tasks.
#[derive(Debug, Clone, Copy)]
pub struct Launch {
    pub offer: Uuid,
    pub landing_page: Uuid,
    pub create_teaser: Uuid,
    pub post_teaser: Uuid,
    pub twitter_thread: Uuid,
    pub email_sequence: Uuid,
    pub launch_review: Uuid,
}

/// Seven-day product launch with seven tasks.
///
/// "Post Teaser Video" (day 4) builds on "Create Teaser Video" (day 3), and
/// the day 7 review builds on the post.
pub fn launch_plan() -> (Plan, Launch) {
    let mut plan = Plan::new("Product Launch", launch_start(), 7);

    let offer = plan.add_task(Task::new("Define Offer", TaskKind::Pillar, 1)).unwrap();
    let landing_page = plan
        .add_task(Task::new("Draft Landing Page", TaskKind::Support, 2))
        .unwrap();
    let create_teaser = plan
        .add_task(Task::new("Create Teaser Video", TaskKind::Pillar, 3).with_description("Film and edit"))
        .unwrap();
    let post_teaser = plan
        .add_task(
            Task::new("Post Teaser Video", TaskKind::Pillar, 4)
                .with_description("Publish on every channel")
                .with_dependency(create_teaser),
        )
        .unwrap();
    let twitter_thread = plan
        .add_task(Task::new("Twitter Thread", TaskKind::Cluster, 4))
        .unwrap();
    let email_sequence = plan
        .add_task(Task::new("Email Sequence", TaskKind::Cluster, 5))
        .unwrap();
    let launch_review = plan
        .add_task(Task::new("Launch Review", TaskKind::Pillar, 7).with_dependency(post_teaser))
        .unwrap();

    let ids = Launch {
        offer,
        landing_page,
        create_teaser,
        post_teaser,
        twitter_thread,
        email_sequence,
        launch_review,
    };
    (plan, ids)
}

/// Mark tasks completed by the user.
pub fn complete(plan: &mut Plan, ids: &[Uuid]) {
    for &id in ids {
        plan.complete_task(id, Utc::now()).unwrap();
    }
}

/// Protocol over an in-memory repository with the clock fixed at `as_of`.
pub fn protocol_at(
    repo: Arc<InMemoryMoveRepository>,
    as_of: NaiveDate,
    config: &ProtocolConfig,
) -> CompressionProtocol {
    CompressionProtocol::new(repo, Arc::new(FixedClock::at_date(as_of)), config)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
