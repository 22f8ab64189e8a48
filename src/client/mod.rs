//! HTTP transport for the document service.
//!
//! [`HttpClient`] performs the raw request/response exchanges and holds no
//! state between calls. The poller and the download manager talk to it
//! through two seams so they can be driven by scripted fakes in tests:
//! - [`TaskTransport`] - submit, status, results
//! - [`ArtifactSource`] - raw artifact bytes
//!
//! No call is retried at this layer; see [`crate::retry`].

mod wire;


use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;

use crate::config::{Config, SubmitEndpoint, UploadLimits};
use crate::error::{Error, Result};
use crate::types::{
    ArtifactRef, HealthStatus, ProcessingResults, SubmitOptions, SubmitReceipt, Task, TaskId,
    TaskSummary, UploadFile,
};
use crate::utils::validate_upload;

/// Stream of raw artifact bytes
pub type ArtifactStream = BoxStream<'static, Result<bytes::Bytes>>;

/// Task lifecycle calls against the service
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Upload a file and start a task
    async fn submit(&self, file: &UploadFile, options: &SubmitOptions) -> Result<SubmitReceipt>;

    /// Fetch the current status snapshot of a task
    async fn get_status(&self, task_id: &TaskId) -> Result<Task>;

    /// Fetch the results of a task
    ///
    /// Only meaningful once the task is terminal with `status = completed`;
    /// callers must check that first.
    async fn fetch_results(&self, task_id: &TaskId) -> Result<ProcessingResults>;
}

/// Source of downloadable artifact content
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Stream the raw bytes of a completed artifact
    async fn fetch_artifact_bytes(&self, artifact: &ArtifactRef) -> Result<ArtifactStream>;
}

/// reqwest-backed client for the document service
#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    submit_endpoint: SubmitEndpoint,
    upload_limits: UploadLimits,
}

impl HttpClient {
    /// Create a client from validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("docviz-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(http, config))
    }

    /// Create a client around an existing reqwest client (shared pools, custom TLS)
    pub fn with_http_client(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            submit_endpoint: config.submit_endpoint,
            upload_limits: config.upload.clone(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn task_url(&self, prefix: &str, task_id: &TaskId) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            prefix,
            urlencoding::encode(task_id.as_str())
        )
    }

    /// Fetch the rendered HTML report of a completed task
    pub async fn fetch_report(&self, task_id: &TaskId) -> Result<String> {
        let url = self.task_url("report", task_id);
        tracing::debug!(task_id = %task_id, "fetching report");
        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response.text().await?)
    }

    /// Liveness probe; not part of the task lifecycle
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = check_status(self.http.get(self.url("/health")).send().await?).await?;
        decode(response, "health response").await
    }

    /// List every task the service currently tracks
    pub async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        let response = check_status(self.http.get(self.url("/tasks")).send().await?).await?;
        let list: wire::TaskListResponse = decode(response, "task list").await?;
        Ok(list.tasks)
    }

    /// Ask the service to drop old tasks; returns how many remain
    pub async fn cleanup(&self) -> Result<u64> {
        let response = check_status(self.http.post(self.url("/cleanup")).send().await?).await?;
        let body: wire::CleanupResponse = decode(response, "cleanup response").await?;
        Ok(body.remaining_tasks)
    }
}

#[async_trait]
impl TaskTransport for HttpClient {
    async fn submit(&self, file: &UploadFile, options: &SubmitOptions) -> Result<SubmitReceipt> {
        validate_upload(file, &self.upload_limits)?;

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("enable_description", options.enable_description.to_string())
            .text("user_query", options.query.clone());

        let url = self.url(self.submit_endpoint.path());
        tracing::info!(
            file = %file.file_name,
            size_bytes = file.bytes.len(),
            endpoint = self.submit_endpoint.path(),
            "submitting document"
        );

        let response = check_status(self.http.post(&url).multipart(form).send().await?).await?;
        let receipt: SubmitReceipt = decode(response, "submit response").await?;

        tracing::info!(task_id = %receipt.task_id, "task created");
        Ok(receipt)
    }

    async fn get_status(&self, task_id: &TaskId) -> Result<Task> {
        let url = self.task_url("status", task_id);
        let response = check_status(self.http.get(&url).send().await?).await?;
        let raw: wire::StatusResponse = decode(response, "status response").await?;
        Ok(raw.into())
    }

    async fn fetch_results(&self, task_id: &TaskId) -> Result<ProcessingResults> {
        let url = self.task_url("results", task_id);
        tracing::debug!(task_id = %task_id, "fetching results");
        let response = check_status(self.http.get(&url).send().await?).await?;
        let raw: wire::ResultsResponse = decode(response, "results response").await?;
        Ok(raw.into_results(task_id.clone()))
    }
}

#[async_trait]
impl ArtifactSource for HttpClient {
    async fn fetch_artifact_bytes(&self, artifact: &ArtifactRef) -> Result<ArtifactStream> {
        let url = format!(
            "{}/{}",
            self.task_url("download", &artifact.task_id),
            artifact.kind.as_str()
        );
        tracing::debug!(task_id = %artifact.task_id, kind = %artifact.kind, "fetching artifact");
        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed())
    }
}

/// Turn a non-success response into [`Error::Transport`]
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "service returned error status");
    Err(Error::from_response_body(status.as_u16(), &body))
}

/// Read the body and decode it, reporting shape mismatches as [`Error::Decode`]
async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &'static str) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Decode {
        what,
        reason: e.to_string(),
    })
}
