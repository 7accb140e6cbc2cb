//! End-to-end sync orchestration: submit, poll, report.

use crate::error::TowerError;
use crate::models::{SyncRequest, SyncResult};
use crate::services::logs::LogSink;
use crate::services::poller::{self, PollConfig};
use crate::services::reporter;
use crate::services::submitter;
use crate::services::tower_client::ProjectSyncApi;
use tokio_util::sync::CancellationToken;

/// Runs project syncs against one controller client.
///
/// The call blocks (asynchronously) until the update reaches a terminal
/// state, the poll ceiling elapses, or the cancellation token fires — except
/// in async mode, where it returns right after the launch is accepted.
/// Exactly one `SyncResult` is produced per request.
pub struct ProjectSyncRunner<A: ProjectSyncApi> {
    api: A,
    poll_config: PollConfig,
}

impl<A: ProjectSyncApi> ProjectSyncRunner<A> {
    /// Runner with default poll configuration.
    pub fn new(api: A) -> Self {
        Self {
            api,
            poll_config: PollConfig::default(),
        }
    }

    /// Runner with an explicit poll configuration.
    pub fn with_poll_config(api: A, poll_config: PollConfig) -> Self {
        Self { api, poll_config }
    }

    /// Execute one sync request.
    pub async fn run(
        &self,
        request: &SyncRequest,
        sink: &mut dyn LogSink,
        cancel: &CancellationToken,
    ) -> Result<SyncResult, TowerError> {
        let mut job = submitter::submit(&self.api, request, sink).await?;

        if request.async_launch {
            return Ok(reporter::report_launched(&job));
        }

        let final_update = poller::poll_until_terminal(
            &self.api,
            &mut job,
            request,
            &self.poll_config,
            sink,
            cancel,
        )
        .await?;

        let result = reporter::report_terminal(&job, final_update.as_ref());
        reporter::finish(result, request.throw_on_failure)
    }
}
