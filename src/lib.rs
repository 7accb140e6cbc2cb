//! Drive Ansible Tower / AWX project syncs from a CI pipeline.
//!
//! A sync runs as submit → poll → report: the submitter resolves the named
//! project and launches a project update on the controller, the poller waits
//! for a terminal state while relaying the update's stdout into a
//! caller-supplied line sink, and the reporter maps the terminal state into a
//! success flag plus a string property map. Async mode skips the poller and
//! returns launch metadata immediately.
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use tower_project_sync::{
//!     project_sync, Credential, StaticCredentials, SyncParams, WriterSink,
//! };
//!
//! # async fn example() -> Result<(), tower_project_sync::TowerError> {
//! let mut creds = StaticCredentials::new();
//! creds.insert("tower-creds", Credential::token("s3cr3t"));
//!
//! let params = SyncParams {
//!     tower_server: "https://tower.example.com".into(),
//!     tower_credentials_id: "tower-creds".into(),
//!     project: "infra-playbooks".into(),
//!     import_tower_logs: Some(true),
//!     ..Default::default()
//! };
//!
//! let mut sink = WriterSink::new(std::io::stdout());
//! let result = project_sync(params, &creds, &mut sink, &CancellationToken::new()).await?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod services;

pub use error::TowerError;
pub use models::{JobState, SyncJob, SyncParams, SyncRequest, SyncResult};
pub use services::{
    Credential, CredentialResolver, KeyringCredentials, LogSink, MemorySink, PollConfig,
    ProjectSyncApi, ProjectSyncRunner, StaticCredentials, TowerClient, TowerClientConfig,
    WriterSink,
};

use tokio_util::sync::CancellationToken;

/// Run one project sync with default poll configuration.
///
/// Applies the parameter defaulting contract, resolves the credential through
/// `resolver`, builds an HTTP client for the named controller, and drives the
/// sync to completion. When the request sets `throwExceptionWhenFail` (the
/// default) any non-success outcome comes back as an error; otherwise the
/// result map is returned for the caller to inspect.
pub async fn project_sync(
    params: SyncParams,
    resolver: &dyn CredentialResolver,
    sink: &mut dyn LogSink,
    cancel: &CancellationToken,
) -> Result<SyncResult, TowerError> {
    let request = params.into_request(resolver)?;
    let client = TowerClient::new(TowerClientConfig::new(
        request.server.clone(),
        request.credential.clone(),
    ))?;
    ProjectSyncRunner::new(client).run(&request, sink, cancel).await
}
