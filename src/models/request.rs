//! Inbound step parameters and the resolved sync request.

use crate::error::TowerError;
use crate::services::credentials::{Credential, CredentialResolver};
use serde::{Deserialize, Serialize};

/// Raw parameters as supplied by the pipeline caller.
///
/// Field names match the original step syntax, so a pipeline-side JSON blob
/// like `{"towerServer": "...", "towerCredentialsId": "...", "project": "..."}`
/// deserializes directly. Optional booleans left out by the caller take the
/// documented defaults: everything `false` except `throwExceptionWhenFail`,
/// which defaults to `true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncParams {
    /// Base URL of the Tower/AWX controller.
    pub tower_server: String,

    /// Credential id, resolved through a [`CredentialResolver`].
    pub tower_credentials_id: String,

    /// Project to sync; either a numeric project id or a project name.
    pub project: String,

    /// Emit informational progress lines into the log sink.
    #[serde(default)]
    pub verbose: Option<bool>,

    /// Relay the remote update's stdout into the log sink.
    #[serde(default)]
    pub import_tower_logs: Option<bool>,

    /// Strip ANSI color escapes from relayed log lines.
    #[serde(default)]
    pub remove_color: Option<bool>,

    /// Abort the step with an error when the sync does not succeed.
    #[serde(default)]
    pub throw_exception_when_fail: Option<bool>,

    /// Return right after the launch is accepted instead of waiting.
    #[serde(default)]
    pub r#async: Option<bool>,
}

impl SyncParams {
    /// Resolve the credential and apply the defaulting contract, producing
    /// an immutable [`SyncRequest`].
    pub fn into_request(self, resolver: &dyn CredentialResolver) -> Result<SyncRequest, TowerError> {
        if self.tower_server.trim().is_empty() {
            return Err(TowerError::invalid_input_field(
                "Tower server is required",
                "towerServer",
            ));
        }
        if self.project.trim().is_empty() {
            return Err(TowerError::invalid_input_field(
                "Project is required",
                "project",
            ));
        }

        let credential = resolver.resolve(&self.tower_credentials_id)?;

        Ok(SyncRequest {
            server: self.tower_server.trim_end_matches('/').to_string(),
            credential,
            project: self.project,
            verbose: self.verbose.unwrap_or(false),
            import_logs: self.import_tower_logs.unwrap_or(false),
            strip_color: self.remove_color.unwrap_or(false),
            throw_on_failure: self.throw_exception_when_fail.unwrap_or(true),
            async_launch: self.r#async.unwrap_or(false),
        })
    }
}

/// A fully resolved sync request. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Controller base URL, without trailing slash.
    pub server: String,

    /// Resolved credential handed to the submitter.
    pub credential: Credential,

    /// Project id or name.
    pub project: String,

    pub verbose: bool,
    pub import_logs: bool,
    pub strip_color: bool,
    pub throw_on_failure: bool,
    pub async_launch: bool,
}
