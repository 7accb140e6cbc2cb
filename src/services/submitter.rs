//! Project resolution and sync launch.

use crate::error::TowerError;
use crate::models::{SyncJob, SyncRequest};
use crate::services::logs::LogSink;
use crate::services::tower_client::{ProjectSyncApi, TowerProject};

/// Resolve the requested project and launch a project update.
///
/// The request's `project` field is taken as a numeric project id when it
/// parses as one, otherwise it is looked up by name. A preflight
/// `can_update` check turns "this project has nothing to sync" into a
/// descriptive error instead of a launch rejection.
///
/// Not idempotent: every call creates a new update job on the controller.
pub async fn submit<A: ProjectSyncApi>(
    api: &A,
    request: &SyncRequest,
    sink: &mut dyn LogSink,
) -> Result<SyncJob, TowerError> {
    let project = resolve_project(api, &request.project).await?;

    if !api.can_update(project.id).await? {
        return Err(TowerError::invalid_input(format!(
            "Project {:?} (id {}) on {} cannot be updated; check its SCM configuration",
            project.name, project.id, request.server
        )));
    }

    if request.verbose {
        sink.write_line(&format!(
            "Requesting sync of project {:?} (id {}) on {}",
            project.name, project.id, request.server
        ))?;
    }

    let update = api.launch_update(project.id).await?;

    // The job is handed back in Pending state regardless of what status the
    // launch response reports; observing remote state is the poller's job.
    let job = SyncJob::new(update.id, project.id, &request.server);

    if request.verbose {
        sink.write_line(&format!(
            "Project update {} accepted (status: {})",
            update.id, update.status
        ))?;
    }

    Ok(job)
}

async fn resolve_project<A: ProjectSyncApi>(
    api: &A,
    project: &str,
) -> Result<TowerProject, TowerError> {
    match project.trim().parse::<i64>() {
        Ok(id) => api.get_project(id).await,
        Err(_) => api.find_project(project).await,
    }
}
