//! tokio drivers: the scheduler tick loop and the radar frame loop.
//!
//! The scheduler service sits behind one `tokio::sync::Mutex`. Each tick
//! takes the lock only to plan; executions run as separate tasks and
//! re-lock to fold their outcome back in, so a slow query never blocks the
//! next tick.

use std::sync::Arc;
use std::time::Duration;

use nexus_core::{
    AnimationToken, Clock, Dispatch, FrameOutcome, Notification, QueryExecutor, SchedulerError,
    SchedulerService, SpatialView, Surface,
};
use nexus_store::Store;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub type SharedService<C> = Arc<Mutex<SchedulerService<C, Store>>>;

#[derive(Debug, Clone, Copy)]
pub struct DaemonOptions {
    pub tick_interval: Duration,
    /// Stop after this many ticks once in-flight executions finish.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub skipped_running: u64,
    pub notifications: u64,
    pub errors: u64,
}

impl DaemonStats {
    fn record(
        &mut self,
        joined: Result<Result<Option<Notification>, SchedulerError>, tokio::task::JoinError>,
    ) {
        match joined {
            Ok(Ok(Some(_))) => self.notifications += 1,
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                tracing::warn!("agent completion failed: {e}");
                self.errors += 1;
            }
            Err(e) => {
                tracing::warn!("agent task panicked or was cancelled: {e}");
                self.errors += 1;
            }
        }
    }
}

fn log_notification(notification: Notification) {
    match &notification {
        Notification::NewResults {
            agent_id,
            new_results_count,
        } => tracing::info!(%agent_id, new_results_count, "new results"),
        Notification::ExecutionFailed { agent_id, error } => {
            tracing::warn!(%agent_id, %error, "agent execution failed")
        }
    }
}

/// Tick until `shutdown` fires or `max_ticks` is reached, then wait for
/// executions still in flight.
pub async fn run<C, E>(
    service: SharedService<C>,
    executor: Arc<E>,
    options: DaemonOptions,
    shutdown: CancellationToken,
) -> DaemonStats
where
    C: Clock + 'static,
    E: QueryExecutor + 'static,
{
    let mut interval = tokio::time::interval(options.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut inflight = JoinSet::new();
    let mut stats = DaemonStats::default();

    tracing::info!(interval = ?options.tick_interval, "scheduler daemon started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                tracing::info!("shutdown requested");
                break;
            }
            Some(joined) = inflight.join_next() => stats.record(joined),
            _ = interval.tick() => {
                stats.ticks += 1;
                let planned = service.lock().await.begin_tick();
                match planned {
                    Ok(plan) => {
                        stats.dispatched += plan.dispatches.len() as u64;
                        stats.skipped_running += plan.skipped_running.len() as u64;
                        for id in &plan.skipped_running {
                            tracing::debug!(agent_id = %id, "still running, skipped");
                        }
                        for dispatch in plan.dispatches {
                            tracing::debug!(agent_id = %dispatch.agent_id, "dispatching");
                            inflight.spawn(execute(service.clone(), executor.clone(), dispatch));
                        }
                    }
                    Err(e) => {
                        tracing::warn!("failed to load agents for tick: {e}");
                        stats.errors += 1;
                    }
                }
                if options.max_ticks.is_some_and(|max| stats.ticks >= max) {
                    break;
                }
            }
        }
    }

    while let Some(joined) = inflight.join_next().await {
        stats.record(joined);
    }
    tracing::info!(?stats, "scheduler daemon stopped");
    stats
}

async fn execute<C, E>(
    service: SharedService<C>,
    executor: Arc<E>,
    dispatch: Dispatch,
) -> Result<Option<Notification>, SchedulerError>
where
    C: Clock,
    E: QueryExecutor,
{
    let outcome = executor.execute(&dispatch.request).await;
    let mut service = service.lock().await;
    let notification = service.complete(&dispatch, outcome, &log_notification)?;
    if let Some(n) = &notification {
        let at = service.clock().now();
        if let Err(e) = service.store().record_notification(n, at) {
            tracing::warn!("failed to log notification: {e}");
        }
    }
    Ok(notification)
}

/// Drive `on_frame` until the token is cancelled or superseded, or until
/// `max_frames` frames were drawn (the view is torn down then). Returns
/// the number of frames drawn.
pub async fn animate<S, C>(
    view: Arc<Mutex<SpatialView<S>>>,
    token: AnimationToken,
    clock: C,
    frame_interval: Duration,
    max_frames: Option<u64>,
) -> u64
where
    S: Surface + Send + 'static,
    C: Clock,
{
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames = 0;

    loop {
        interval.tick().await;
        let mut guard = view.lock().await;
        match guard.on_frame(&token, clock.now()) {
            FrameOutcome::Stopped => break,
            FrameOutcome::Throttled => continue,
            FrameOutcome::Drawn => {
                frames += 1;
                if max_frames.is_some_and(|max| frames >= max) {
                    guard.teardown();
                    break;
                }
            }
        }
    }
    tracing::debug!(token = token.id(), frames, "animation loop ended");
    frames
}
