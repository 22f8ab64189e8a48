//! Artifact downloads
//!
//! [`DownloadManager`] resolves an [`ArtifactRef`] into bytes through an
//! [`ArtifactSource`] and hands the complete content to a [`SaveSink`]
//! exactly once, under a file name derived from the task id and artifact
//! kind. If the fetch fails nothing is saved.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use tokio::sync::Mutex;

use crate::client::ArtifactSource;
use crate::config::{DownloadConfig, FileCollisionAction};
use crate::error::{Error, Result};
use crate::types::{ArtifactRef, Artifacts};
use crate::utils::get_unique_path;

/// What a sink did with an artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedArtifact {
    /// File name requested by the download manager
    pub file_name: String,
    /// Number of bytes saved
    pub size_bytes: u64,
    /// Final location, for sinks that write to disk
    pub path: Option<PathBuf>,
}

/// Destination for downloaded artifacts (disk, memory, a UI save dialog, ...)
#[async_trait]
pub trait SaveSink: Send + Sync {
    /// Persist `content` under `file_name`
    async fn save(&self, file_name: &str, content: Bytes) -> Result<SavedArtifact>;
}

/// Writes artifacts into a directory
#[derive(Clone, Debug)]
pub struct FileSystemSink {
    output_dir: PathBuf,
    file_collision: FileCollisionAction,
}

impl FileSystemSink {
    /// Create a sink writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, file_collision: FileCollisionAction) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_collision,
        }
    }

    /// Create a sink from the download section of the configuration
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(config.output_dir.clone(), config.file_collision)
    }

    /// Directory artifacts are written to
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }
}

#[async_trait]
impl SaveSink for FileSystemSink {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<SavedArtifact> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = get_unique_path(&self.output_dir.join(file_name), self.file_collision)?;
        tokio::fs::write(&path, &content).await?;

        tracing::info!(path = %path.display(), size_bytes = content.len(), "artifact saved");
        Ok(SavedArtifact {
            file_name: file_name.to_string(),
            size_bytes: content.len() as u64,
            path: Some(path),
        })
    }
}

/// Keeps saved artifacts in memory
///
/// Useful when the embedding application wants to present the bytes itself.
#[derive(Debug, Default)]
pub struct MemorySink {
    saves: Mutex<Vec<(String, Bytes)>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(file_name, content)` saved so far, in order
    pub async fn saves(&self) -> Vec<(String, Bytes)> {
        self.saves.lock().await.clone()
    }

    /// Number of save actions performed
    pub async fn save_count(&self) -> usize {
        self.saves.lock().await.len()
    }
}

#[async_trait]
impl SaveSink for MemorySink {
    async fn save(&self, file_name: &str, content: Bytes) -> Result<SavedArtifact> {
        let size_bytes = content.len() as u64;
        self.saves.lock().await.push((file_name.to_string(), content));
        Ok(SavedArtifact {
            file_name: file_name.to_string(),
            size_bytes,
            path: None,
        })
    }
}

/// Fetches artifacts and saves them through a sink
pub struct DownloadManager<S: ArtifactSource + ?Sized, K: SaveSink + ?Sized> {
    source: Arc<S>,
    sink: Arc<K>,
}

impl<S: ArtifactSource + ?Sized, K: SaveSink + ?Sized> DownloadManager<S, K> {
    /// Create a manager over an artifact source and a save sink
    pub fn new(source: Arc<S>, sink: Arc<K>) -> Self {
        Self { source, sink }
    }

    /// Download one artifact and save it exactly once
    ///
    /// The whole body is read before the sink is invoked, so a fetch that
    /// fails halfway leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the backing fetch (e.g. `Transport { status: 404 }`),
    /// or the sink's error.
    pub async fn download(&self, artifact: &ArtifactRef) -> Result<SavedArtifact> {
        let file_name = artifact.file_name();
        tracing::debug!(task_id = %artifact.task_id, kind = %artifact.kind, "downloading artifact");

        let content = self
            .source
            .fetch_artifact_bytes(artifact)
            .await?
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok::<_, Error>(buf)
            })
            .await?
            .freeze();

        self.sink.save(&file_name, content).await
    }

    /// Download every artifact a completed task advertises, JSON first
    pub async fn download_all(&self, artifacts: &Artifacts) -> Result<Vec<SavedArtifact>> {
        let mut saved = Vec::new();
        for artifact in [&artifacts.json, &artifacts.html].into_iter().flatten() {
            saved.push(self.download(artifact).await?);
        }
        Ok(saved)
    }
}
