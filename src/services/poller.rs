//! Status polling and log streaming for a launched project update.
//!
//! One logical worker per sync: status and log fetches are interleaved in a
//! single poll loop, which is enough because the controller serves both from
//! the same update resource. Suspension points are the network calls and the
//! backoff sleep; the sleep races the caller's cancellation token.

use crate::error::TowerError;
use crate::models::{JobState, SyncJob, SyncRequest};
use crate::services::logs::{LogRelay, LogSink};
use crate::services::tower_client::{ProjectSyncApi, ProjectUpdate};
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Poll loop configuration.
///
/// The ceiling is mandatory: a sync that never reaches a terminal state must
/// fail with a poll error instead of waiting forever.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second status fetch; doubles per poll up to
    /// `max_interval`.
    pub initial_interval: Duration,

    /// Upper bound for the backoff interval.
    pub max_interval: Duration,

    /// Total wait budget for the update to reach a terminal state.
    pub ceiling: Duration,

    /// Consecutive transient failures tolerated before giving up.
    pub max_transient_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            ceiling: Duration::from_secs(3600),
            max_transient_failures: 5,
        }
    }
}

/// Capped exponential backoff with ±15% jitter.
struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    fn new(config: &PollConfig) -> Self {
        Self {
            next: config.initial_interval,
            max: config.max_interval,
        }
    }

    fn advance(&mut self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.85..1.15);
        let interval = self.next.mul_f64(jitter);
        self.next = (self.next * 2).min(self.max);
        interval
    }
}

/// Poll `job` until it reaches a terminal state, relaying logs if requested.
///
/// Returns the last update fetched from the controller, or `None` when the
/// caller cancelled; in that case the job is left in `Canceled` state and no
/// further requests are issued. Transient fetch failures (network, 5xx, 429)
/// are retried up to `max_transient_failures` times in a row; all other
/// errors propagate immediately. Once the ceiling elapses without a terminal
/// state the loop fails with a poll error.
pub async fn poll_until_terminal<A: ProjectSyncApi>(
    api: &A,
    job: &mut SyncJob,
    request: &SyncRequest,
    config: &PollConfig,
    sink: &mut dyn LogSink,
    cancel: &CancellationToken,
) -> Result<Option<ProjectUpdate>, TowerError> {
    let deadline = tokio::time::Instant::now() + config.ceiling;
    let mut backoff = Backoff::new(config);
    let mut relay = request.import_logs.then(|| LogRelay::new(request.strip_color));
    let mut transient_failures = 0u32;
    let mut last_update = None;

    loop {
        if cancel.is_cancelled() {
            return Ok(cancelled(job, request, sink)?);
        }

        match api.get_update(job.id).await {
            Ok(update) => {
                transient_failures = 0;
                match JobState::from_remote(&update.status) {
                    Some(state) => {
                        if job.observe(state) && request.verbose {
                            sink.write_line(&format!(
                                "Project update {} is {}",
                                job.id,
                                job.state()
                            ))?;
                        }
                    }
                    None => log::warn!(
                        "update {}: unknown remote status {:?}",
                        job.id,
                        update.status
                    ),
                }
                last_update = Some(update);
            }
            Err(e) if e.is_retryable() => {
                transient_failures += 1;
                if transient_failures > config.max_transient_failures {
                    return Err(e);
                }
                log::warn!(
                    "update {}: transient poll failure {}/{}: {}",
                    job.id,
                    transient_failures,
                    config.max_transient_failures,
                    e
                );
            }
            Err(e) => return Err(e),
        }

        if let Some(relay) = relay.as_mut() {
            match api.get_update_stdout(job.id).await {
                Ok(snapshot) => {
                    relay.relay(&snapshot, sink, job.is_terminal())?;
                }
                // Logs are best-effort mid-run; a lost snapshot is retried
                // implicitly on the next poll because snapshots are cumulative.
                Err(e) if e.is_retryable() => {
                    log::warn!("update {}: log fetch failed: {}", job.id, e)
                }
                Err(e) => return Err(e),
            }
        }

        if job.is_terminal() {
            return Ok(last_update);
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(TowerError::poll_for_job(
                format!(
                    "Project update {} on {} did not reach a terminal state within {}s",
                    job.id,
                    job.server,
                    config.ceiling.as_secs()
                ),
                job.id,
            ));
        }

        let wait = backoff.advance().min(deadline.saturating_duration_since(now));
        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(cancelled(job, request, sink)?);
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }
}

fn cancelled(
    job: &mut SyncJob,
    request: &SyncRequest,
    sink: &mut dyn LogSink,
) -> Result<Option<ProjectUpdate>, TowerError> {
    job.observe(JobState::Canceled);
    if request.verbose {
        sink.write_line(&format!("Project update {} wait canceled by caller", job.id))?;
    }
    Ok(None)
}
