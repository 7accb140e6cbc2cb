//! Error types for the project sync client.
//!
//! These errors are serializable so callers embedding the crate in a larger
//! pipeline runner can relay them over IPC or persist them in run records.

use crate::models::SyncResult;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while submitting, polling, or reporting a project sync.
///
/// All variants serialize to a structured JSON object for consumers that
/// record step outcomes.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum TowerError {
    /// Authentication against the controller failed or was rejected.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Requested resource (server, project, update) could not be resolved.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Network-level failure talking to the controller.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The controller answered with a non-success status.
    #[error("Tower API error: {message}")]
    Api {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// The update never reached a terminal state within the poll ceiling.
    #[error("Poll error: {message}")]
    Poll {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        job_id: Option<i64>,
    },

    /// The remote job finished but not successfully.
    #[error("Project sync failed: {message}")]
    SyncFailed { message: String, result: SyncResult },

    /// Credential storage operation failed.
    #[error("Credential storage error: {message}")]
    CredentialStorage { message: String },

    /// Invalid input provided by the caller.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Internal client error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TowerError {
    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with the identifier that failed to resolve.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create an API error with status code and endpoint.
    pub fn api_full(message: impl Into<String>, status_code: u16, endpoint: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a poll error.
    pub fn poll(message: impl Into<String>) -> Self {
        Self::Poll {
            message: message.into(),
            job_id: None,
        }
    }

    /// Create a poll error tagged with the update id being watched.
    pub fn poll_for_job(message: impl Into<String>, job_id: i64) -> Self {
        Self::Poll {
            message: message.into(),
            job_id: Some(job_id),
        }
    }

    /// Create a sync failed error carrying the terminal result.
    pub fn sync_failed(message: impl Into<String>, result: SyncResult) -> Self {
        Self::SyncFailed {
            message: message.into(),
            result,
        }
    }

    /// Create a credential storage error.
    pub fn credential_storage(message: impl Into<String>) -> Self {
        Self::CredentialStorage {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the poller may retry after this error.
    ///
    /// Network-level failures and server-side transient statuses (5xx, 429)
    /// are retryable; everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Api { status_code, .. } => {
                matches!(status_code, Some(code) if *code >= 500 || *code == 429)
            }
            _ => false,
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for TowerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport("Request timed out")
        } else if err.is_connect() {
            Self::transport("Failed to connect to server")
        } else if err.is_status() {
            Self::api(format!("HTTP error: {}", err))
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TowerError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for TowerError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("Log sink error: {}", err))
    }
}
