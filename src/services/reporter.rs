//! Terminal outcome mapping.
//!
//! Turns a finished (or launched-and-left, in async mode) job into the
//! `SyncResult` handed back to the caller, and applies the throw-on-failure
//! contract.

use crate::error::TowerError;
use crate::models::result::keys;
use crate::models::{JobState, SyncJob, SyncResult};
use crate::services::tower_client::ProjectUpdate;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// Build the result for a job that reached a terminal state.
///
/// `success` is true exactly when the terminal state was `Succeeded`. The
/// property map always carries the job id and final state; elapsed/finished
/// metadata is passed through when the controller reported it.
pub fn report_terminal(job: &SyncJob, update: Option<&ProjectUpdate>) -> SyncResult {
    let mut properties = base_properties(job);

    if let Some(update) = update {
        if let Some(elapsed) = update.elapsed {
            properties.insert(keys::ELAPSED.to_string(), format!("{:.1}", elapsed));
        }
        if let Some(finished) = &update.finished {
            properties.insert(keys::FINISHED.to_string(), normalize_finished(finished));
        }
    }

    SyncResult::new(job.state() == JobState::Succeeded, properties)
}

/// Build the launch-only result for an async request.
///
/// The poller never ran, so the map carries launch metadata only and
/// `success` reflects that the launch was accepted.
pub fn report_launched(job: &SyncJob) -> SyncResult {
    SyncResult::new(true, base_properties(job))
}

/// Apply the throw-on-failure contract to a finished result.
pub fn finish(result: SyncResult, throw_on_failure: bool) -> Result<SyncResult, TowerError> {
    if result.success || !throw_on_failure {
        return Ok(result);
    }

    let message = format!(
        "Project sync job {} on {} finished with status {}",
        result.get(keys::JOB_ID).unwrap_or("?"),
        result.get(keys::JOB_URL).unwrap_or("?"),
        result.get(keys::STATUS).unwrap_or("unknown"),
    );
    Err(TowerError::sync_failed(message, result))
}

/// Normalize the controller's `finished` timestamp to UTC RFC 3339 with
/// second precision. The controller reports microseconds and, depending on
/// its settings, a non-UTC offset; an unparseable value passes through.
fn normalize_finished(finished: &str) -> String {
    match DateTime::parse_from_rfc3339(finished) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(err) => {
            log::warn!("unparseable finished timestamp {:?}: {}", finished, err);
            finished.to_string()
        }
    }
}

fn base_properties(job: &SyncJob) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    properties.insert(keys::JOB_ID.to_string(), job.id.to_string());
    properties.insert(keys::STATUS.to_string(), job.state().to_string());
    properties.insert(keys::PROJECT_ID.to_string(), job.project_id.to_string());
    properties.insert(
        keys::JOB_URL.to_string(),
        format!("{}/#/jobs/project/{}", job.server, job.id),
    );
    properties
}
