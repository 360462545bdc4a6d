//! REST client for the admin API.
//!
//! [`DashboardApi`] is the seam the dashboard controller depends on;
//! [`AdminApi`] implements it over HTTP with [`reqwest`]. Every request
//! carries the bearer token, cache-defeating headers, and a fresh
//! `X-Request-Id`; every read also carries a `_t=<millis>` query parameter
//! so intermediary caches never answer it.

use std::time::Duration;

use async_trait::async_trait;
use dataco_core::bug_report::BugReport;
use dataco_core::forms::{NewSubtask, SubtaskUpdate, TaskForm, VisibilityUpdate};
use dataco_core::project::Project;
use dataco_core::subtask::Subtask;
use dataco_core::task::Task;
use reqwest::header::{HeaderValue, AUTHORIZATION, CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::{Method, RequestBuilder, StatusCode, Url};

use crate::envelope::{extract, MutationResponse};
use crate::error::ApiError;
use crate::session::AuthContext;

/// Operations the dashboard needs from the admin API.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn get_task(&self, task_id: &str) -> Result<Task, ApiError>;
    async fn get_project(&self, project_id: &str) -> Result<Project, ApiError>;
    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Subtask>, ApiError>;
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn create_task(&self, form: &TaskForm) -> Result<(), ApiError>;
    async fn update_task(&self, task_id: &str, form: &TaskForm) -> Result<(), ApiError>;
    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError>;
    async fn set_task_visibility(&self, task_id: &str, visible: bool) -> Result<(), ApiError>;

    async fn create_subtask(&self, form: &NewSubtask) -> Result<(), ApiError>;
    async fn update_subtask(&self, subtask_id: &str, form: &SubtaskUpdate) -> Result<(), ApiError>;
    async fn delete_subtask(&self, subtask_id: &str) -> Result<(), ApiError>;
    async fn set_subtask_visibility(&self, subtask_id: &str, visible: bool) -> Result<(), ApiError>;

    /// Ask the server to recompute a task's `amountNeeded` from its
    /// subtasks.
    async fn recalculate_amount(&self, task_id: &str) -> Result<(), ApiError>;

    async fn submit_bug_report(&self, report: &BugReport) -> Result<(), ApiError>;
}

/// HTTP client for one admin API deployment.
#[derive(Debug)]
pub struct AdminApi {
    client: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl AdminApi {
    /// * `base_url` - API origin, e.g. `http://host:3000` (no `/api`).
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, auth)
    }

    /// Build a client whose requests time out after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        auth: AuthContext,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, auth))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, auth: AuthContext) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    // ---- private helpers ----

    /// Resolve path segments against the base URL, percent-encoding each
    /// one so an id can never address a different resource.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start an authenticated request with cache-defeating headers.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let token = self.auth.bearer()?;
        let url = self.endpoint(segments)?;
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::debug!(%method, path = url.path(), request_id = %request_id, "Admin API request");

        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, HeaderValue::from_static("0"))
            .header("x-request-id", request_id))
    }

    /// GET with a `_t` cache-buster, returning the parsed JSON body.
    async fn read(&self, segments: &[&str]) -> Result<serde_json::Value, ApiError> {
        let ts = chrono::Utc::now().timestamp_millis();
        let response = self
            .request(Method::GET, segments)?
            .query(&[("_t", ts)])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.json::<serde_json::Value>().await?)
    }

    /// Send a mutation and interpret its `{success, error?}` body.
    ///
    /// A non-2xx status with a parseable body still surfaces the
    /// server's message as [`ApiError::Rejected`].
    async fn mutate(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated("server rejected the admin token".into()));
        }

        let body = response.text().await?;
        match serde_json::from_str::<MutationResponse>(&body) {
            Ok(parsed) => parsed.into_result(),
            Err(_) if status.is_success() => Err(ApiError::Decode(format!(
                "expected {{success}} body, got: {body}"
            ))),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Send a request whose only meaningful output is the HTTP status.
    async fn status_only(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated("server rejected the admin token".into()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DashboardApi for AdminApi {
    async fn get_task(&self, task_id: &str) -> Result<Task, ApiError> {
        let body = self.read(&["api", "tasks", task_id]).await?;
        extract(body, "task")
    }

    async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        let body = self.read(&["api", "projects", project_id]).await?;
        extract(body, "project")
    }

    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Subtask>, ApiError> {
        let body = self.read(&["api", "tasks", task_id, "subtasks"]).await?;
        extract(body, "subtasks")
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let body = self.read(&["api", "projects"]).await?;
        extract(body, "projects")
    }

    async fn create_task(&self, form: &TaskForm) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &["api", "tasks"])?.json(form);
        self.mutate(builder).await
    }

    async fn update_task(&self, task_id: &str, form: &TaskForm) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &["api", "tasks", task_id])?
            .json(form);
        self.mutate(builder).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &["api", "tasks", task_id])?;
        self.mutate(builder).await
    }

    async fn set_task_visibility(&self, task_id: &str, visible: bool) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &["api", "tasks", task_id, "visibility"])?
            .json(&VisibilityUpdate { is_visible: visible });
        self.status_only(builder).await
    }

    async fn create_subtask(&self, form: &NewSubtask) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &["api", "subtasks"])?.json(form);
        self.mutate(builder).await
    }

    async fn update_subtask(&self, subtask_id: &str, form: &SubtaskUpdate) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &["api", "subtasks", subtask_id])?
            .json(form);
        self.mutate(builder).await
    }

    async fn delete_subtask(&self, subtask_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &["api", "subtasks", subtask_id])?;
        self.status_only(builder).await
    }

    async fn set_subtask_visibility(&self, subtask_id: &str, visible: bool) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &["api", "subtasks", subtask_id, "visibility"])?
            .json(&VisibilityUpdate { is_visible: visible });
        self.status_only(builder).await
    }

    async fn recalculate_amount(&self, task_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &["api", "tasks", task_id, "calculate-amount"])?;
        self.status_only(builder).await
    }

    async fn submit_bug_report(&self, report: &BugReport) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &["api", "bug-reports"])?.json(report);
        self.mutate(builder).await
    }
}
