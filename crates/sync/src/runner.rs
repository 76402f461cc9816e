//! Debounced periodic task runner.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use warden_audit::{Actor, AuditLog, AuditLogEntry};

/// A periodic job's effect.
///
/// Failure is contained by the runner: logged, no audit entry written, so
/// the next tick retries.
pub type JobEffect = Box<dyn Fn() -> Result<(), JobEffectError> + Send + Sync>;

/// Supplies the configured debounce interval on every tick (external
/// configuration collaborator; the value can change between ticks).
pub type IntervalProvider = Box<dyn Fn() -> Result<Duration, String> + Send + Sync>;

/// A periodic task's effect failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("job effect failed: {0}")]
pub struct JobEffectError(pub String);

impl JobEffectError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A registered periodic task.
///
/// Ticks on `tick_every`; each tick consults the audit log and the interval
/// provider to decide whether the effect actually runs.
pub struct DebouncedTask {
    pub action_tag: String,
    pub module: String,
    pub tick_every: Duration,
    interval: IntervalProvider,
    effect: JobEffect,
}

impl DebouncedTask {
    pub fn new<I, E>(
        action_tag: impl Into<String>,
        module: impl Into<String>,
        tick_every: Duration,
        interval: I,
        effect: E,
    ) -> Self
    where
        I: Fn() -> Result<Duration, String> + Send + Sync + 'static,
        E: Fn() -> Result<(), JobEffectError> + Send + Sync + 'static,
    {
        Self {
            action_tag: action_tag.into(),
            module: module.into(),
            tick_every,
            interval: Box::new(interval),
            effect: Box::new(effect),
        }
    }
}

/// What a single tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The effect ran and the run was recorded.
    Ran,
    /// A recorded run younger than the interval exists; nothing happened.
    Skipped,
    /// The effect failed. Deliberately not recorded, so the next tick
    /// retries immediately; repeated failures retry every tick with no
    /// backoff (intentional simplification).
    EffectFailed,
    /// The interval provider or the audit log was unavailable; skip and
    /// retry next tick.
    Unavailable,
}

/// Run one tick of `task` at `now`.
///
/// Separated from the ticker thread so tests can drive synthetic clocks.
/// Two processes ticking concurrently may both observe a stale last
/// occurrence and run in the same narrow window; that race is accepted
/// under the single-instance assumption.
pub fn tick_at<A: AuditLog>(task: &DebouncedTask, audit: &A, now: DateTime<Utc>) -> TickOutcome {
    let interval = match (task.interval)() {
        Ok(interval) => interval,
        Err(e) => {
            warn!(task = %task.action_tag, error = %e, "interval unavailable, skipping tick");
            return TickOutcome::Unavailable;
        }
    };

    let last = match audit.last_occurrence(&task.action_tag) {
        Ok(last) => last,
        Err(e) => {
            warn!(task = %task.action_tag, error = %e, "audit log unavailable, skipping tick");
            return TickOutcome::Unavailable;
        }
    };

    if let Some(last) = last {
        // Clock skew (a last occurrence in the future) reads as zero elapsed.
        let elapsed = (now - last.created_at).to_std().unwrap_or(Duration::ZERO);
        if elapsed < interval {
            debug!(
                task = %task.action_tag,
                elapsed_secs = elapsed.as_secs(),
                interval_secs = interval.as_secs(),
                "within debounce interval, skipping"
            );
            return TickOutcome::Skipped;
        }
    }

    if let Err(e) = (task.effect)() {
        error!(task = %task.action_tag, error = %e, "job effect failed");
        return TickOutcome::EffectFailed;
    }

    let entry = AuditLogEntry::new(
        None,
        Actor::System,
        task.action_tag.clone(),
        task.module.clone(),
        serde_json::json!({ "interval_secs": interval.as_secs() }),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
    );

    // The effect already succeeded; a failed record is alertable but must
    // not undo the run.
    if let Err(e) = audit.record(entry) {
        error!(task = %task.action_tag, error = %e, "failed to record run");
    }

    info!(task = %task.action_tag, "job effect ran");
    TickOutcome::Ran
}

/// Handle to control a running ticker.
#[derive(Debug)]
pub struct TaskHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl TaskHandle {
    /// Request graceful shutdown and wait for the ticker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Spawn a ticker thread for `task` against the shared audit log.
pub fn spawn<A>(task: DebouncedTask, audit: A) -> TaskHandle
where
    A: AuditLog + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let name = format!("warden-sync-{}", task.action_tag);
    let join = thread::Builder::new()
        .name(name)
        .spawn(move || {
            ticker_loop(task, audit, shutdown_rx);
        })
        .expect("failed to spawn periodic task thread");

    TaskHandle {
        shutdown: shutdown_tx,
        join: Some(join),
    }
}

fn ticker_loop<A: AuditLog>(task: DebouncedTask, audit: A, shutdown_rx: mpsc::Receiver<()>) {
    info!(task = %task.action_tag, "periodic task started");

    loop {
        match shutdown_rx.recv_timeout(task.tick_every) {
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tick_at(&task, &audit, Utc::now());
            }
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(task = %task.action_tag, "periodic task stopped");
}
