//! Core types for docviz-client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a document-processing task
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing state of a task
///
/// States advance `pending → ocr_processing → analyzing → visualizing` and end
/// in one of the two terminal states, `completed` or `error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted, not started yet
    Pending,
    /// OCR running
    OcrProcessing,
    /// Structured analysis running
    Analyzing,
    /// Report generation running
    Visualizing,
    /// Finished successfully; results are available
    Completed,
    /// Finished with an error
    Error,
}

impl TaskState {
    /// Whether no further transitions are valid from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Error)
    }

    /// Position in the lifecycle order; both terminal states share the last rank
    pub fn rank(&self) -> u8 {
        match self {
            TaskState::Pending => 0,
            TaskState::OcrProcessing => 1,
            TaskState::Analyzing => 2,
            TaskState::Visualizing => 3,
            TaskState::Completed | TaskState::Error => 4,
        }
    }

    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::OcrProcessing => "ocr_processing",
            TaskState::Analyzing => "analyzing",
            TaskState::Visualizing => "visualizing",
            TaskState::Completed => "completed",
            TaskState::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one task as reported by `/status/{task_id}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    pub id: TaskId,
    /// Current state
    pub status: TaskState,
    /// Progress percentage (0 to 100)
    pub progress: u8,
    /// Human-readable name of the current step
    pub current_step: String,
    /// Latest status message
    pub message: String,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task was last updated (never earlier than `created_at`)
    pub updated_at: DateTime<Utc>,
    /// Whether the server holds (partial or final) results
    pub has_results: bool,
}

impl Task {
    /// Locally-assigned `pending` task, used between submit and the first poll
    pub fn pending(id: TaskId, message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: TaskState::Pending,
            progress: 0,
            current_step: String::new(),
            message: message.into(),
            created_at: now,
            updated_at: now,
            has_results: false,
        }
    }

    /// Whether the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Options sent alongside an uploaded file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Ask the OCR stage to also describe images
    pub enable_description: bool,
    /// Free-text analysis instruction for the report stage
    pub query: String,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        crate::config::Config::default().default_submit_options()
    }
}

/// A file ready to be uploaded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    /// File name reported to the service (its extension selects the OCR mode)
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create an upload from in-memory contents
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an upload from disk
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { file_name, bytes })
    }

    /// Lower-cased extension including the leading dot (e.g. ".pdf")
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
    }
}

/// File details echoed back by the service on upload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Original file name
    #[serde(default)]
    pub filename: String,
    /// Size in bytes
    #[serde(default)]
    pub size_bytes: u64,
    /// Size in megabytes, rounded by the server
    #[serde(default)]
    pub size_mb: f64,
}

/// Acknowledgement returned by a submit endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Identifier of the newly created task
    #[serde(alias = "job_id")]
    pub task_id: TaskId,
    /// Initial status string as reported by the service (free-form)
    #[serde(default)]
    pub status: Option<String>,
    /// Server message
    #[serde(default)]
    pub message: Option<String>,
    /// Echoed file details
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}

/// OCR stage output
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Recognized text, as markdown
    #[serde(rename = "markdown", default)]
    pub text: String,
    /// Number of pages processed
    #[serde(default)]
    pub page_count: u32,
    /// Name of the processed file
    #[serde(default)]
    pub file_name: String,
    /// Wall-clock OCR time in seconds
    #[serde(rename = "processing_time", default)]
    pub processing_time_seconds: f64,
    /// Stage status string (e.g. "success")
    #[serde(default)]
    pub status: String,
}

/// Structured analysis stage output
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Number of chunks the document was split into
    #[serde(default)]
    pub total_chunks: u32,
    /// Per-chunk analysis records, kept opaque
    #[serde(default)]
    pub analyzed_chunks: Vec<serde_json::Value>,
    /// Free-form analysis metadata
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Visualization stage output
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationOutput {
    /// Self-contained HTML report
    #[serde(rename = "html", default)]
    pub renderable_markup: String,
    /// Report title
    #[serde(default)]
    pub title: String,
    /// Short textual summary
    #[serde(rename = "summary", default)]
    pub summary_text: String,
}

/// Kind of downloadable artifact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Full results as JSON
    Json,
    /// HTML report
    Html,
}

impl ArtifactKind {
    /// Path segment used by `/download/{task_id}/{kind}`
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Json => "json",
            ArtifactKind::Html => "html",
        }
    }

    /// Deterministic local file name for this kind of artifact
    pub fn file_name(&self, task_id: &TaskId) -> String {
        match self {
            ArtifactKind::Json => format!("results_{}.json", task_id),
            ArtifactKind::Html => format!("report_{}.html", task_id),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ArtifactKind::Json),
            "html" => Ok(ArtifactKind::Html),
            other => Err(crate::error::Error::Config {
                message: format!("unknown artifact kind '{}' (expected json or html)", other),
                key: Some("kind".to_string()),
            }),
        }
    }
}

/// Reference to one downloadable artifact of a task
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Owning task
    pub task_id: TaskId,
    /// Artifact kind
    pub kind: ArtifactKind,
}

impl ArtifactRef {
    /// Create a new artifact reference
    pub fn new(task_id: TaskId, kind: ArtifactKind) -> Self {
        Self { task_id, kind }
    }

    /// Deterministic local file name (`results_<id>.json` / `report_<id>.html`)
    pub fn file_name(&self) -> String {
        self.kind.file_name(&self.task_id)
    }
}

/// Artifacts advertised by a completed task
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    /// JSON results artifact, if the server produced one
    pub json: Option<ArtifactRef>,
    /// HTML report artifact, if the server produced one
    pub html: Option<ArtifactRef>,
}

/// Everything a completed task produced
///
/// Built once, when the poller observes `completed`, and never mutated afterward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResults {
    /// Task that produced these results
    pub task_id: TaskId,
    /// OCR stage output
    pub ocr: OcrOutput,
    /// Analysis stage output
    pub analysis: AnalysisOutput,
    /// Visualization stage output
    pub visualization: VisualizationOutput,
    /// Downloadable artifacts
    pub artifacts: Artifacts,
}

impl ProcessingResults {
    /// Text the dataset extractor should run on, if there is any
    pub fn extractable_text(&self) -> Option<&str> {
        let text = self.ocr.text.trim();
        (!text.is_empty()).then_some(self.ocr.text.as_str())
    }
}

/// One `(category, value)` pair of a dataset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// X-axis category (duplicates allowed)
    pub category: String,
    /// Numeric value
    pub value: f64,
}

impl DataPoint {
    /// Create a new data point
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
        }
    }
}

/// A labeled, ordered numeric series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Series label
    pub label: String,
    /// Points in encounter order
    pub points: Vec<DataPoint>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            points: Vec::new(),
        }
    }

    /// Whether the dataset holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Service liveness report from `/health`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status string, "healthy" when the service is up
    pub status: String,
    /// Server timestamp
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Number of tasks the server currently tracks
    #[serde(default)]
    pub active_tasks: Option<u64>,
}

impl HealthStatus {
    /// Whether the service reported itself healthy
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Entry of the `/tasks` listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task identifier
    pub task_id: TaskId,
    /// Current state
    pub status: TaskState,
    /// Current step name
    #[serde(default)]
    pub current_step: String,
    /// Progress percentage
    #[serde(default)]
    pub progress: u8,
    /// Creation time
    #[serde(with = "timestamp_serde")]
    pub created_at: DateTime<Utc>,
    /// Last update time
    #[serde(with = "timestamp_serde")]
    pub updated_at: DateTime<Utc>,
}

/// Timestamp (de)serialization accepting both RFC 3339 and the naive ISO-8601
/// strings produced by the service (interpreted as UTC)
pub(crate) mod timestamp_serde {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }
}
