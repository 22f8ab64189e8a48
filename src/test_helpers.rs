//! Shared test helpers: a scripted in-memory transport and snapshot builders.

use crate::client::{ArtifactSource, ArtifactStream, TaskTransport};
use crate::error::{Error, Result};
use crate::types::{
    ArtifactKind, ArtifactRef, Artifacts, OcrOutput, ProcessingResults, SubmitOptions,
    SubmitReceipt, Task, TaskId, TaskState, UploadFile,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Build a status snapshot with deterministic timestamps
pub(crate) fn snapshot(id: &str, status: TaskState, progress: u8, message: &str) -> Task {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Task {
        id: TaskId::from(id),
        status,
        progress,
        current_step: status.as_str().to_string(),
        message: message.to_string(),
        created_at: created,
        updated_at: created + chrono::Duration::seconds(i64::from(progress)),
        has_results: status == TaskState::Completed,
    }
}

/// Results whose OCR text is `text`, with both artifacts available
pub(crate) fn sample_results(id: &str, text: &str) -> ProcessingResults {
    let task_id = TaskId::from(id);
    ProcessingResults {
        task_id: task_id.clone(),
        ocr: OcrOutput {
            text: text.to_string(),
            page_count: 1,
            file_name: "report.pdf".to_string(),
            processing_time_seconds: 1.0,
            status: "success".to_string(),
        },
        analysis: Default::default(),
        visualization: Default::default(),
        artifacts: Artifacts {
            json: Some(ArtifactRef::new(task_id.clone(), ArtifactKind::Json)),
            html: Some(ArtifactRef::new(task_id, ArtifactKind::Html)),
        },
    }
}

/// Transport that replays a fixed script of status responses
///
/// Once the script is drained the last successful snapshot is repeated.
pub(crate) struct ScriptedTransport {
    task_ids: Mutex<VecDeque<TaskId>>,
    statuses: Mutex<VecDeque<Result<Task>>>,
    last_status: Mutex<Option<Task>>,
    results: Mutex<Option<Result<ProcessingResults>>>,
    artifacts: Vec<(ArtifactKind, Vec<u8>)>,
    status_delay: Option<Duration>,
    pub submit_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub results_calls: AtomicU32,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            task_ids: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            results: Mutex::new(None),
            artifacts: Vec::new(),
            status_delay: None,
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            results_calls: AtomicU32::new(0),
        }
    }

    /// Task ids handed out by successive `submit` calls
    pub(crate) fn with_task_ids(self, ids: &[&str]) -> Self {
        *self.task_ids.lock().unwrap() = ids.iter().map(|id| TaskId::from(*id)).collect();
        self
    }

    pub(crate) fn push_status(self, task: Task) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(task));
        self
    }

    pub(crate) fn push_error(self, error: Error) -> Self {
        self.statuses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Re-arm the status script, e.g. for a second submission
    pub(crate) fn queue_status(&self, task: Task) {
        self.statuses.lock().unwrap().push_back(Ok(task));
    }

    pub(crate) fn with_results(self, results: ProcessingResults) -> Self {
        *self.results.lock().unwrap() = Some(Ok(results));
        self
    }

    pub(crate) fn fail_results(self, error: Error) -> Self {
        *self.results.lock().unwrap() = Some(Err(error));
        self
    }

    pub(crate) fn with_artifact(mut self, kind: ArtifactKind, bytes: &[u8]) -> Self {
        self.artifacts.push((kind, bytes.to_vec()));
        self
    }

    pub(crate) fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub(crate) fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn results_calls(&self) -> u32 {
        self.results_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskTransport for ScriptedTransport {
    async fn submit(&self, _file: &UploadFile, _options: &SubmitOptions) -> Result<SubmitReceipt> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let task_id = self
            .task_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TaskId::from("scripted-task"));
        Ok(SubmitReceipt {
            task_id,
            status: Some("processing".to_string()),
            message: None,
            file_info: None,
        })
    }

    async fn get_status(&self, task_id: &TaskId) -> Result<Task> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(Ok(task)) => {
                *self.last_status.lock().unwrap() = Some(task.clone());
                Ok(task)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self
                .last_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| snapshot(task_id.as_str(), TaskState::Pending, 0, "queued"))),
        }
    }

    async fn fetch_results(&self, task_id: &TaskId) -> Result<ProcessingResults> {
        self.results_calls.fetch_add(1, Ordering::SeqCst);
        match self.results.lock().unwrap().take() {
            Some(result) => result,
            None => Ok(sample_results(task_id.as_str(), "")),
        }
    }
}

#[async_trait]
impl ArtifactSource for ScriptedTransport {
    async fn fetch_artifact_bytes(&self, artifact: &ArtifactRef) -> Result<ArtifactStream> {
        let bytes = self
            .artifacts
            .iter()
            .find(|(kind, _)| *kind == artifact.kind)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| Error::Transport {
                status: 404,
                detail: "文件不存在".to_string(),
            })?;

        // Two chunks so consumers have to join them
        let mid = bytes.len() / 2;
        let chunks = vec![
            Ok(bytes::Bytes::copy_from_slice(&bytes[..mid])),
            Ok(bytes::Bytes::copy_from_slice(&bytes[mid..])),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }
}
