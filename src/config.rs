//! Configuration types for docviz-client

use crate::error::{Error, Result};
use crate::types::SubmitOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Submit endpoint exposed by the service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitEndpoint {
    /// `POST /ocr`
    Ocr,
    /// `POST /ocr/real`
    OcrReal,
    /// `POST /upload` (full OCR → analysis → visualization pipeline)
    #[default]
    Upload,
}

impl SubmitEndpoint {
    /// Request path of the endpoint
    pub fn path(&self) -> &'static str {
        match self {
            SubmitEndpoint::Ocr => "/ocr",
            SubmitEndpoint::OcrReal => "/ocr/real",
            SubmitEndpoint::Upload => "/upload",
        }
    }
}

/// Status polling configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between two polls (default: 2000 ms)
    #[serde(
        rename = "interval_ms",
        default = "default_poll_interval",
        with = "millis_serde"
    )]
    pub interval: Duration,

    /// Maximum number of status polls before giving up (default: 150, about 5 minutes)
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,

    /// Per-request timeout for a single status poll (None = transport default)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_attempts: default_poll_attempts(),
            request_timeout: None,
        }
    }
}

/// Retry behavior for transient status-poll failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 0, failures surface immediately)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Client-side checks applied before a file is uploaded
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadLimits {
    /// Maximum upload size in megabytes (default: 100)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Accepted file extensions, with leading dot
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            supported_extensions: default_supported_extensions(),
        }
    }
}

impl UploadLimits {
    /// Maximum upload size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Whether the (dotted, any case) extension is accepted
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.supported_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// What to do when a downloaded artifact's file name already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to the file name (default)
    #[default]
    Rename,
    /// Overwrite the existing file
    Overwrite,
    /// Refuse to save
    Skip,
}

/// Local artifact download settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory artifacts are saved into (default: "./downloads")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File collision handling
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// Main configuration for the document service client
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the service (default: "http://localhost:8708")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint used to submit files
    #[serde(default)]
    pub submit_endpoint: SubmitEndpoint,

    /// Analysis instruction sent when the caller provides none
    #[serde(default = "default_query")]
    pub default_query: String,

    /// Whether image description is requested by default
    #[serde(default)]
    pub enable_description: bool,

    /// Status polling settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Retry settings for transient poll failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Upload validation limits
    #[serde(default)]
    pub upload: UploadLimits,

    /// Artifact download settings
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            submit_endpoint: SubmitEndpoint::default(),
            default_query: default_query(),
            enable_description: false,
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            upload: UploadLimits::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl Config {
    /// Config pointing at the given service, everything else default
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Submit options built from the configured defaults
    pub fn default_submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            enable_description: self.enable_description,
            query: self.default_query.clone(),
        }
    }

    /// Check the settings that would otherwise fail late
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("unsupported URL scheme '{}'", parsed.scheme()),
                key: Some("base_url".to_string()),
            });
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::Config {
                message: "poll.max_attempts must be at least 1".to_string(),
                key: Some("poll.max_attempts".to_string()),
            });
        }
        if self.poll.interval.is_zero() {
            return Err(Error::Config {
                message: "poll.interval_ms must be greater than zero".to_string(),
                key: Some("poll.interval_ms".to_string()),
            });
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config {
                message: format!(
                    "retry.backoff_multiplier must be a finite value >= 1.0, got {multiplier}"
                ),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8708".to_string()
}

fn default_query() -> String {
    "分析此文档并生成可视化报告".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(2000)
}

fn default_poll_attempts() -> u32 {
    150
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_supported_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".pdf", ".txt", ".md"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
