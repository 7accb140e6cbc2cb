//! Scripted mock of [`ProjectSyncApi`] shared by the service tests.

use crate::error::TowerError;
use crate::services::tower_client::{ProjectSyncApi, ProjectUpdate, TowerProject};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a project update with the given id and remote status.
pub(crate) fn update(id: i64, status: &str) -> ProjectUpdate {
    ProjectUpdate {
        id,
        status: status.to_string(),
        failed: matches!(status, "failed" | "error" | "canceled"),
        elapsed: Some(4.2),
        finished: None,
        job_explanation: None,
    }
}

/// Mock controller holding one project and scripted poll responses.
///
/// `statuses` and `stdouts` are consumed front to back, one entry per poll;
/// once a queue is empty the last consumed entry repeats, so a script ending
/// in `running` simulates a job that never finishes.
pub(crate) struct MockApi {
    pub project: TowerProject,
    pub can_update: bool,
    pub launched: ProjectUpdate,
    pub statuses: Mutex<VecDeque<Result<ProjectUpdate, TowerError>>>,
    pub stdouts: Mutex<VecDeque<String>>,
    last_status: Mutex<Option<ProjectUpdate>>,
    last_stdout: Mutex<String>,
    find_calls: AtomicUsize,
    launch_calls: AtomicUsize,
    status_calls: AtomicUsize,
    stdout_calls: AtomicUsize,
}

impl MockApi {
    pub fn with_project(id: i64, name: &str) -> Self {
        Self {
            project: TowerProject {
                id,
                name: name.to_string(),
                scm_type: Some("git".to_string()),
                scm_url: None,
                status: None,
            },
            can_update: true,
            launched: update(100, "pending"),
            statuses: Mutex::new(VecDeque::new()),
            stdouts: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            last_stdout: Mutex::new(String::new()),
            find_calls: AtomicUsize::new(0),
            launch_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            stdout_calls: AtomicUsize::new(0),
        }
    }

    /// Script the status sequence returned by successive `get_update` calls.
    pub fn script_statuses(&self, statuses: &[&str]) {
        let mut queue = self.statuses.lock().unwrap();
        for status in statuses {
            queue.push_back(Ok(update(self.launched.id, status)));
        }
    }

    /// Script an error for one `get_update` call.
    pub fn script_status_error(&self, error: TowerError) {
        self.statuses.lock().unwrap().push_back(Err(error));
    }

    /// Script the cumulative stdout snapshots returned by successive
    /// `get_update_stdout` calls.
    pub fn script_stdouts(&self, snapshots: &[&str]) {
        let mut queue = self.stdouts.lock().unwrap();
        for snapshot in snapshots {
            queue.push_back((*snapshot).to_string());
        }
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn launch_calls(&self) -> usize {
        self.launch_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn stdout_calls(&self) -> usize {
        self.stdout_calls.load(Ordering::SeqCst)
    }
}

impl ProjectSyncApi for MockApi {
    async fn find_project(&self, name: &str) -> Result<TowerProject, TowerError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if name == self.project.name {
            Ok(self.project.clone())
        } else {
            Err(TowerError::not_found_with_id("project", name))
        }
    }

    async fn get_project(&self, id: i64) -> Result<TowerProject, TowerError> {
        if id == self.project.id {
            Ok(self.project.clone())
        } else {
            Err(TowerError::not_found_with_id("project", id.to_string()))
        }
    }

    async fn can_update(&self, _project_id: i64) -> Result<bool, TowerError> {
        Ok(self.can_update)
    }

    async fn launch_update(&self, _project_id: i64) -> Result<ProjectUpdate, TowerError> {
        self.launch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.launched.clone())
    }

    async fn get_update(&self, _update_id: i64) -> Result<ProjectUpdate, TowerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.lock().unwrap().pop_front() {
            Some(Ok(update)) => {
                *self.last_status.lock().unwrap() = Some(update.clone());
                Ok(update)
            }
            Some(Err(e)) => Err(e),
            None => {
                let last = self.last_status.lock().unwrap().clone();
                Ok(last.unwrap_or_else(|| self.launched.clone()))
            }
        }
    }

    async fn get_update_stdout(&self, _update_id: i64) -> Result<String, TowerError> {
        self.stdout_calls.fetch_add(1, Ordering::SeqCst);
        match self.stdouts.lock().unwrap().pop_front() {
            Some(snapshot) => {
                *self.last_stdout.lock().unwrap() = snapshot.clone();
                Ok(snapshot)
            }
            None => Ok(self.last_stdout.lock().unwrap().clone()),
        }
    }
}
