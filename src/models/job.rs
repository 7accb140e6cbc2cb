//! Remote job state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a remote project update as observed by the poller.
///
/// `Pending` and `Running` are the only non-terminal states. Once a terminal
/// state is reached no further transitions occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Error,
}

impl JobState {
    /// Map a Tower/AWX status string onto a job state.
    ///
    /// Returns `None` for status strings this client does not know, in which
    /// case the previous state is kept.
    pub fn from_remote(status: &str) -> Option<Self> {
        match status.to_lowercase().as_str() {
            "new" | "pending" | "waiting" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "successful" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            "canceled" => Some(Self::Canceled),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether this state ends the job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Rank used to enforce monotonic progression; terminal states share the
    /// top rank so a terminal observation can never be displaced.
    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed | Self::Canceled | Self::Error => 2,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "successful"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A project update job created on the controller.
///
/// Created by the submitter with `state = Pending`; mutated only by the
/// poller as it observes remote state transitions. Transitions are monotonic:
/// a regression reported by the remote (e.g. `running` after `successful`,
/// which can happen when polls race a controller-side retry) is ignored.
#[derive(Debug, Clone, Serialize)]
pub struct SyncJob {
    /// Remote project update id.
    pub id: i64,

    /// Id of the project being synced.
    pub project_id: i64,

    /// Base URL of the controller that owns the job.
    pub server: String,

    /// When the launch was accepted.
    pub submitted_at: DateTime<Utc>,

    /// Last observed state.
    state: JobState,
}

impl SyncJob {
    /// Create a job in `Pending` state.
    pub fn new(id: i64, project_id: i64, server: impl Into<String>) -> Self {
        Self {
            id,
            project_id,
            server: server.into(),
            submitted_at: Utc::now(),
            state: JobState::Pending,
        }
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Record an observed remote state.
    ///
    /// Returns `true` when the state actually advanced. Observations that
    /// would regress the state machine, or arrive after a terminal state, are
    /// dropped.
    pub fn observe(&mut self, observed: JobState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if observed.rank() < self.state.rank() {
            log::warn!(
                "update {}: ignoring state regression {} -> {}",
                self.id,
                self.state,
                observed
            );
            return false;
        }
        if observed == self.state {
            return false;
        }
        self.state = observed;
        true
    }
}
