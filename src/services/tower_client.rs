//! Ansible Tower / AWX API client.
//!
//! Provides the [`ProjectSyncApi`] trait the submitter and poller are written
//! against, plus [`TowerClient`], the HTTP implementation targeting the
//! controller's v2 REST API.

use crate::error::TowerError;
use crate::services::credentials::Credential;
use base64::Engine;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Tower client configuration.
#[derive(Debug, Clone)]
pub struct TowerClientConfig {
    /// Base URL of the controller (e.g. `https://tower.example.com`).
    pub base_url: String,

    /// Credential used for every request.
    pub credential: Credential,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl TowerClientConfig {
    /// Config with the default 30 second request timeout.
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            credential,
            timeout_secs: 30,
        }
    }
}

/// A project as returned by the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct TowerProject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub scm_type: Option<String>,
    #[serde(default)]
    pub scm_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A project update (sync job) as returned by the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectUpdate {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub elapsed: Option<f64>,
    #[serde(default)]
    pub finished: Option<String>,
    #[serde(default)]
    pub job_explanation: Option<String>,
}

/// Answer to the pre-launch updatability check.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCheck {
    pub can_update: bool,
}

/// One page of a list endpoint (`{count, results}`).
#[derive(Debug, Deserialize)]
pub struct ResultsPage<T> {
    pub count: i64,
    pub results: Vec<T>,
}

/// Remote operations needed to drive a project sync.
///
/// The wire shape is controller-defined; keeping this a trait lets tests
/// script responses and lets other controllers be plugged in behind the same
/// submit/poll/report cycle.
#[allow(async_fn_in_trait)]
pub trait ProjectSyncApi {
    /// Look a project up by name. Fails with `NotFound` when no project
    /// matches and `InvalidInput` when the name is ambiguous.
    async fn find_project(&self, name: &str) -> Result<TowerProject, TowerError>;

    /// Fetch a project by id.
    async fn get_project(&self, id: i64) -> Result<TowerProject, TowerError>;

    /// Whether the project can be updated (has SCM configured etc.).
    async fn can_update(&self, project_id: i64) -> Result<bool, TowerError>;

    /// Launch a project update. Each call creates a new remote job.
    async fn launch_update(&self, project_id: i64) -> Result<ProjectUpdate, TowerError>;

    /// Fetch the current state of a project update.
    async fn get_update(&self, update_id: i64) -> Result<ProjectUpdate, TowerError>;

    /// Fetch the full stdout of a project update so far. An update with no
    /// output yet yields an empty string.
    async fn get_update_stdout(&self, update_id: i64) -> Result<String, TowerError>;
}

/// HTTP client for the controller's v2 REST API.
#[derive(Debug, Clone)]
pub struct TowerClient {
    client: Client,
    base_url: String,
}

impl TowerClient {
    /// Create a new client with authentication baked into every request.
    pub fn new(config: TowerClientConfig) -> Result<Self, TowerError> {
        let mut headers = header::HeaderMap::new();

        let auth_value = match &config.credential {
            Credential::Token(token) => format!("Bearer {}", token),
            Credential::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
        };
        let mut auth_value = header::HeaderValue::from_str(&auth_value)
            .map_err(|_| TowerError::authentication("Invalid credential format"))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TowerError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v2{}", self.base_url, path)
    }

    /// Handle API response errors.
    ///
    /// The controller reports errors as `{"detail": "..."}`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, TowerError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| TowerError::internal(format!("Failed to parse response: {}", e)))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(TowerError::authentication(format!(
                "Tower rejected the credential ({}) for {}",
                status.as_u16(),
                endpoint
            )))
        } else if status == StatusCode::NOT_FOUND {
            Err(TowerError::not_found_with_id("endpoint", endpoint))
        } else {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from));

            let message = match detail {
                Some(detail) => detail,
                None => format!("Request failed ({}): {}", status_code, body),
            };

            Err(TowerError::api_full(message, status_code, endpoint))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&impl Serialize>,
    ) -> Result<T, TowerError> {
        let url = self.api_url(endpoint);
        let mut request = self.client.get(&url);
        if let Some(q) = query {
            request = request.query(q);
        }
        let response = request.send().await?;
        self.handle_response(response, endpoint).await
    }
}

impl ProjectSyncApi for TowerClient {
    async fn find_project(&self, name: &str) -> Result<TowerProject, TowerError> {
        let endpoint = "/projects/";
        let page: ResultsPage<TowerProject> =
            self.get_json(endpoint, Some(&[("name", name)])).await?;

        match page.count {
            0 => Err(TowerError::not_found_with_id("project", name)),
            1 => page
                .results
                .into_iter()
                .next()
                .ok_or_else(|| TowerError::internal("Project list page was empty")),
            n => Err(TowerError::invalid_input(format!(
                "Project name {:?} matched {} projects",
                name, n
            ))),
        }
    }

    async fn get_project(&self, id: i64) -> Result<TowerProject, TowerError> {
        let endpoint = format!("/projects/{}/", id);
        self.get_json(&endpoint, None::<&()>).await.map_err(|e| match e {
            // The generic 404 mapping loses the project id; restore it.
            TowerError::NotFound { .. } => {
                TowerError::not_found_with_id("project", id.to_string())
            }
            other => other,
        })
    }

    async fn can_update(&self, project_id: i64) -> Result<bool, TowerError> {
        let endpoint = format!("/projects/{}/update/", project_id);
        let check: UpdateCheck = self.get_json(&endpoint, None::<&()>).await?;
        Ok(check.can_update)
    }

    async fn launch_update(&self, project_id: i64) -> Result<ProjectUpdate, TowerError> {
        let endpoint = format!("/projects/{}/update/", project_id);
        let url = self.api_url(&endpoint);
        let response = self.client.post(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    async fn get_update(&self, update_id: i64) -> Result<ProjectUpdate, TowerError> {
        let endpoint = format!("/project_updates/{}/", update_id);
        self.get_json(&endpoint, None::<&()>).await
    }

    async fn get_update_stdout(&self, update_id: i64) -> Result<String, TowerError> {
        let endpoint = format!("/project_updates/{}/stdout/", update_id);
        let url = self.api_url(&endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "txt")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // No output captured yet
            return Ok(String::new());
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TowerError::authentication(format!(
                "Tower rejected the credential ({}) for {}",
                status.as_u16(),
                endpoint
            )));
        }
        if !status.is_success() {
            return Err(TowerError::api_full(
                "Failed to fetch update stdout",
                status.as_u16(),
                &endpoint,
            ));
        }

        response
            .text()
            .await
            .map_err(|e| TowerError::internal(format!("Failed to read update stdout: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_construction() {
        let client = TowerClient::new(TowerClientConfig::new(
            "https://tower.example.com/",
            Credential::token("t"),
        ))
        .unwrap();
        assert_eq!(
            client.api_url("/projects/5/update/"),
            "https://tower.example.com/api/v2/projects/5/update/"
        );
    }

    #[test]
    fn test_invalid_credential_header_rejected() {
        let err = TowerClient::new(TowerClientConfig::new(
            "https://tower.example.com",
            Credential::token("bad\ntoken"),
        ))
        .unwrap_err();
        assert!(matches!(err, TowerError::Authentication { .. }));
    }

    #[test]
    fn test_project_update_deserialization() {
        let json = r#"{
            "id": 311,
            "status": "running",
            "failed": false,
            "elapsed": 12.4,
            "finished": null,
            "type": "project_update"
        }"#;
        let update: ProjectUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.id, 311);
        assert_eq!(update.status, "running");
        assert!(!update.failed);
        assert_eq!(update.elapsed, Some(12.4));
        assert!(update.finished.is_none());
    }

    #[test]
    fn test_results_page_deserialization() {
        let json = r#"{
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{"id": 9, "name": "infra-playbooks", "scm_type": "git"}]
        }"#;
        let page: ResultsPage<TowerProject> = serde_json::from_str(json).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].name, "infra-playbooks");
        assert_eq!(page.results[0].scm_type.as_deref(), Some("git"));
    }
}
