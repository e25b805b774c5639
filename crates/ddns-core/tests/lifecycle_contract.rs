//! Architectural Contract Test: Service Lifecycle
//!
//! This test verifies the Start/Stop behaviour of the update service on a
//! paused clock.
//!
//! Constraints verified:
//! - Start rejects an invalid plan before any lookup
//! - Start runs one cycle immediately, then one per interval
//! - Stop terminates the background task and no cycle follows
//! - Stop abandons an in-flight cycle within the grace period
//! - Stop leaves no task behind, even when it has to abort one
//! - Cycles never overlap; ticks missed during a long cycle are skipped
//! - A stopped service can be started again
//!
//! If this test fails, someone has added:
//! - Detached background tasks
//! - Tasks that ignore cancellation
//! - Work before configuration validation

mod common;

use common::*;
use ddns_core::config::UpdatePlan;
use ddns_core::traits::{AddressFamily, Credentials};
use ddns_core::{Orchestrator, ServiceHooks, ServiceState, UPDATE_INTERVAL, UpdateService};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn service(
    resolver: &Arc<ScriptedResolver>,
    updater: &Arc<RecordingUpdater>,
    plan: UpdatePlan,
) -> UpdateService {
    UpdateService::new(Orchestrator::new(resolver.clone(), updater.clone(), plan))
}

#[tokio::test(start_paused = true)]
async fn start_updates_immediately_then_every_interval() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), Some(222)));

    assert_ok!(service.start().await);
    assert_eq!(service.state(), ServiceState::Running);
    assert_eq!(updater.update_count(), 2, "first cycle runs before start returns");

    tokio::time::sleep(UPDATE_INTERVAL - Duration::from_secs(1)).await;
    assert_eq!(updater.update_count(), 2, "no cycle before the interval elapses");

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(updater.update_count(), 4, "second cycle after one interval");

    tokio::time::sleep(UPDATE_INTERVAL).await;
    assert_eq!(updater.update_count(), 6);

    assert_ok!(service.stop().await);
}

#[tokio::test(start_paused = true)]
async fn invalid_plan_fails_start_without_lookups() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(None, None));

    let err = assert_err!(service.start().await);
    assert!(err.is_config());
    assert!(err.to_string().contains("record id for IPv4 or IPv6"));

    assert_eq!(resolver.call_count(), 0);
    assert_eq!(updater.update_count(), 0);
    assert_eq!(service.state(), ServiceState::Stopped);
    assert_eq!(service.active_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_secret_fails_start() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut plan = plan(Some(111), None);
    plan.credentials = Credentials::new("id", "");
    let mut service = service(&resolver, &updater, plan);

    let err = assert_err!(service.start().await);
    assert!(err.is_config());
    assert!(err.to_string().contains("secret key"));
    assert_eq!(resolver.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_ends_periodic_updates() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), Some(222)));

    assert_ok!(service.start().await);
    assert!(service.worker_alive());
    assert_eq!(service.active_tasks(), 1);

    assert_ok!(service.stop().await);
    assert_eq!(service.state(), ServiceState::Stopped);
    assert!(!service.worker_alive());
    assert_eq!(service.active_tasks(), 0, "background task released the orchestrator");

    let updates = updater.update_count();
    tokio::time::sleep(UPDATE_INTERVAL * 6).await;
    assert_eq!(updater.update_count(), updates, "no cycle after stop");
}

#[tokio::test(start_paused = true)]
async fn stop_abandons_in_flight_cycle() {
    let resolver = Arc::new(ScriptedResolver::new().with_delay(Duration::from_secs(60)));
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), Some(222)));

    // Initial cycle: two 60s lookups
    assert_ok!(service.start().await);
    assert_eq!(updater.update_count(), 2);

    // Land inside the first scheduled cycle's IPv4 lookup
    tokio::time::sleep(UPDATE_INTERVAL + Duration::from_secs(10)).await;
    assert_eq!(resolver.call_count(), 3);

    let stop_started = Instant::now();
    assert_ok!(service.stop().await);
    assert!(stop_started.elapsed() < ddns_core::service::STOP_GRACE_PERIOD);
    assert_eq!(service.active_tasks(), 0);

    tokio::time::sleep(UPDATE_INTERVAL * 4).await;
    assert_eq!(resolver.call_count(), 3, "abandoned cycle never resumed");
    assert_eq!(updater.update_count(), 2, "abandoned cycle never pushed");
}

#[tokio::test(start_paused = true)]
async fn stop_without_start_is_noop() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), None));

    assert_ok!(service.stop().await);
    assert_ok!(service.stop().await);
    assert_eq!(service.state(), ServiceState::Stopped);
    assert_eq!(resolver.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn double_start_is_rejected() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), None));

    assert_ok!(service.start().await);
    let err = assert_err!(service.start().await);
    assert!(!err.is_config());
    assert_eq!(service.state(), ServiceState::Running);
    assert_eq!(updater.update_count(), 1, "rejected start runs no cycle");
    assert_eq!(service.active_tasks(), 1, "still a single background task");

    assert_ok!(service.stop().await);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_rearms() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), None));
    let hooks: &mut dyn ServiceHooks = &mut service;

    assert_ok!(hooks.start().await);
    assert_ok!(hooks.stop().await);
    assert_ok!(hooks.start().await);
    assert_eq!(updater.update_count(), 2, "restart runs its own immediate cycle");

    tokio::time::sleep(UPDATE_INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(updater.update_count(), 3);

    assert_ok!(hooks.stop().await);
    assert_eq!(service.active_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn custom_interval_is_honoured() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), None))
        .with_interval(Duration::from_secs(30));

    assert_ok!(service.start().await);
    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(updater.update_count(), 4, "initial cycle plus three ticks");

    assert_ok!(service.stop().await);
}

#[tokio::test(start_paused = true)]
async fn overrunning_cycle_skips_missed_ticks() {
    let resolver = Arc::new(ScriptedResolver::new());
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), Some(222)))
        .with_interval(Duration::from_secs(30));

    assert_ok!(service.start().await);
    assert_eq!(updater.update_count(), 2);

    // Cycle due at t=30 takes 80s and runs past the ticks due at 60 and 90
    resolver.set_delay(Some(Duration::from_secs(40)));
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(resolver.call_count(), 4, "slow cycle is on its IPv6 lookup");
    assert_eq!(updater.update_count(), 3);
    resolver.set_delay(None);

    // t=110: slow cycle ends and one late tick fires; next tick at t=120
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(resolver.call_count(), 8, "missed ticks are not replayed");
    assert_eq!(updater.update_count(), 8);

    assert_eq!(resolver.max_in_flight(), 1, "cycles never overlap");
    assert_eq!(
        resolver.calls(),
        [AddressFamily::V4, AddressFamily::V6].repeat(4),
        "each cycle runs IPv4 then IPv6 to completion"
    );

    assert_ok!(service.stop().await);
}

#[tokio::test(start_paused = true)]
async fn stop_after_grace_timeout_leaves_no_task() {
    let resolver = Arc::new(ScriptedResolver::new().with_delay(Duration::from_secs(60)));
    let updater = Arc::new(RecordingUpdater::new());
    let mut service = service(&resolver, &updater, plan(Some(111), None))
        .with_grace_period(Duration::ZERO);

    assert_ok!(service.start().await);
    tokio::time::sleep(UPDATE_INTERVAL + Duration::from_secs(10)).await;
    assert_eq!(resolver.call_count(), 3, "scheduled cycle is in flight");

    assert_ok!(service.stop().await);
    assert_eq!(service.state(), ServiceState::Stopped);
    assert!(!service.worker_alive());
    assert_eq!(service.active_tasks(), 0, "task is gone when stop returns");
}
