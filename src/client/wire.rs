//! Response bodies as the service sends them

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::{
    AnalysisOutput, ArtifactKind, ArtifactRef, Artifacts, OcrOutput, ProcessingResults, Task,
    TaskId, TaskState, TaskSummary, VisualizationOutput, timestamp_serde,
};

/// Body of `GET /status/{task_id}`
#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub task_id: TaskId,
    pub status: TaskState,
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub message: String,
    #[serde(with = "timestamp_serde")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp_serde")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub has_results: bool,
}

impl From<StatusResponse> for Task {
    fn from(raw: StatusResponse) -> Self {
        Task {
            id: raw.task_id,
            status: raw.status,
            progress: raw.progress.clamp(0, 100) as u8,
            current_step: raw.current_step,
            message: raw.message,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            has_results: raw.has_results,
        }
    }
}

/// Server-side artifact paths listed under `files`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultFiles {
    #[serde(default)]
    pub json_file: Option<String>,
    #[serde(default)]
    pub html_file: Option<String>,
}

/// Body of `GET /results/{task_id}`
#[derive(Debug, Deserialize)]
pub(crate) struct ResultsResponse {
    #[serde(default)]
    pub ocr_result: OcrOutput,
    #[serde(default)]
    pub analysis_result: AnalysisOutput,
    #[serde(default)]
    pub visualization_result: VisualizationOutput,
    #[serde(default)]
    pub files: Option<ResultFiles>,
}

impl ResultsResponse {
    /// Attach the task id; artifact paths are server-local and only their presence matters
    pub fn into_results(self, task_id: TaskId) -> ProcessingResults {
        let files = self.files.unwrap_or_default();
        let artifact = |present: bool, kind: ArtifactKind| {
            present.then(|| ArtifactRef::new(task_id.clone(), kind))
        };
        let artifacts = Artifacts {
            json: artifact(files.json_file.is_some(), ArtifactKind::Json),
            html: artifact(files.html_file.is_some(), ArtifactKind::Html),
        };

        ProcessingResults {
            task_id,
            ocr: self.ocr_result,
            analysis: self.analysis_result,
            visualization: self.visualization_result,
            artifacts,
        }
    }
}

/// Body of `GET /tasks`
#[derive(Debug, Deserialize)]
pub(crate) struct TaskListResponse {
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
}

/// Body of `POST /cleanup`
#[derive(Debug, Deserialize)]
pub(crate) struct CleanupResponse {
    #[serde(default)]
    pub remaining_tasks: u64,
}
