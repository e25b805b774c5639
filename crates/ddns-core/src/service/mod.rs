// # Service Lifecycle Controller
//
// Owns the periodic update loop and exposes Start/Stop hooks to whatever
// hosts the process (foreground runner or OS service manager).
//
// ## State machine
//
// ```text
//   Stopped ──start()──▶ Running ──stop()──▶ Stopping ──▶ Stopped
//      ▲                                                    │
//      └──────────────── start() again (re-arm) ◀───────────┘
// ```
//
// ## Scheduling
//
// - `start()` runs one cycle before returning, so the first update never
//   waits a full interval
// - A single background task then runs a cycle on every interval tick
// - Cycles run inline in that task, so two cycles never overlap; ticks
//   missed while a cycle overran are skipped
// - `stop()` cancels a `CancellationToken`; an in-flight cycle is abandoned
//   and the task is awaited for a bounded grace period, then aborted

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;
use crate::traits::AddressFamily;

/// Fixed period between scheduled cycles
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// How long `stop()` waits for the background task before aborting it
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Lifecycle state of the update service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Not running (initial and final state)
    Stopped,
    /// Background loop active
    Running,
    /// Stop requested, waiting for the background task
    Stopping,
}

/// Start/Stop hooks handed to the process host
///
/// Implemented by [`UpdateService`]; the daemon only depends on this trait,
/// which keeps the update loop testable without a real service manager.
#[async_trait]
pub trait ServiceHooks: Send {
    /// Validate configuration, run the first cycle and arm the timer
    async fn start(&mut self) -> Result<()>;

    /// Stop the timer and terminate the background task
    async fn stop(&mut self) -> Result<()>;
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic DNS update service
pub struct UpdateService {
    /// Shared with the background task
    orchestrator: Arc<Orchestrator>,

    /// Period between scheduled cycles
    interval: Duration,

    /// Bound on how long `stop()` waits for the task
    grace_period: Duration,

    state: ServiceState,

    worker: Option<Worker>,
}

impl UpdateService {
    /// Create a stopped service using the default 5-minute interval
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            interval: UPDATE_INTERVAL,
            grace_period: STOP_GRACE_PERIOD,
            state: ServiceState::Stopped,
            worker: None,
        }
    }

    /// Override the period between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the stop grace period
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// The orchestrator driven by this service
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Whether the background task is still alive
    pub fn worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.handle.is_finished())
    }

    /// Number of live tasks still holding the orchestrator
    ///
    /// Zero once `stop()` has returned.
    pub fn active_tasks(&self) -> usize {
        Arc::strong_count(&self.orchestrator) - 1
    }
}

#[async_trait]
impl ServiceHooks for UpdateService {
    async fn start(&mut self) -> Result<()> {
        info!("Service starting");

        if self.state != ServiceState::Stopped {
            return Err(Error::service(format!(
                "cannot start while {:?}",
                self.state
            )));
        }

        let plan = self.orchestrator.plan();
        if let Err(e) = plan.validate() {
            error!("{}", e);
            return Err(e);
        }
        for family in AddressFamily::ALL {
            let target = plan.target(family);
            if !target.is_configured() {
                warn!(
                    "Record id for {} is not set; {} updates will be skipped",
                    family, target.record_type
                );
            }
        }

        self.state = ServiceState::Running;

        info!("Performing initial DNS update");
        let report = self.orchestrator.run_cycle().await;
        debug!(updates = report.updates_attempted(), "Initial update cycle finished");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_update_loop(
            Arc::clone(&self.orchestrator),
            self.interval,
            cancel.clone(),
        ));
        self.worker = Some(Worker { cancel, handle });

        info!(interval_secs = self.interval.as_secs(), "Service started successfully");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        info!("Service stopping");

        let Some(worker) = self.worker.take() else {
            self.state = ServiceState::Stopped;
            debug!("Service was not running");
            return Ok(());
        };

        self.state = ServiceState::Stopping;
        worker.cancel.cancel();

        let mut handle = worker.handle;
        match tokio::time::timeout(self.grace_period, &mut handle).await {
            Ok(Ok(())) => debug!("Background update task joined"),
            Ok(Err(e)) => warn!(error = %e, "Background update task ended abnormally"),
            Err(_) => {
                warn!(
                    grace_secs = self.grace_period.as_secs(),
                    "Background update task did not exit in time; aborting it"
                );
                handle.abort();
                let _ = handle.await;
            }
        }

        self.state = ServiceState::Stopped;
        info!("Service stopped");
        Ok(())
    }
}

impl Drop for UpdateService {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.cancel();
        }
    }
}

/// Background loop: one cycle per tick until cancelled
///
/// The first tick fires one full period after the loop starts, because
/// `start()` already ran the immediate cycle.
async fn run_update_loop(orchestrator: Arc<Orchestrator>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_secs = period.as_secs(), "Background DNS update task started");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                info!("Scheduled DNS update triggered");
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        warn!("Stop requested during an update cycle; abandoning it");
                        break;
                    }
                    report = orchestrator.run_cycle() => {
                        debug!(updates = report.updates_attempted(), "Scheduled update cycle finished");
                    }
                }
            }
        }
    }

    info!("Ticker stopped, background update task exiting");
}
