//! # docviz-client
//!
//! Async client for a document OCR → analysis → visualization service.
//!
//! ## Design Philosophy
//!
//! docviz-client is designed to be:
//! - **Library-first** - No UI; the presentation layer plugs in through callbacks and traits
//! - **Bounded** - Every poll loop has an attempt budget and a cancellation token
//! - **Strict** - Inconsistent status sequences are reported, never silently applied
//! - **Testable** - The HTTP transport sits behind traits that scripted fakes implement
//!
//! ## Quick Start
//!
//! ```no_run
//! use docviz_client::{Config, Pipeline, Task};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(Config::with_base_url("http://localhost:8708"))?;
//!
//!     let outcome = pipeline
//!         .process_path("quarterly.pdf", None, |task: &Task| {
//!             println!("{} {}% {}", task.status, task.progress, task.message);
//!         })
//!         .await?;
//!
//!     println!("{}", outcome.results.visualization.title);
//!     if let Some(datasets) = outcome.datasets {
//!         println!("{} sales points", datasets.sales.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP transport and its trait seams
pub mod client;
/// Configuration types
pub mod config;
/// Artifact downloads and save sinks
pub mod download;
/// Error types
pub mod error;
/// Heuristic text-to-dataset extraction
pub mod extractor;
/// Submit-and-follow session facade
pub mod pipeline;
/// Status polling loop
pub mod poller;
/// Retry logic with exponential backoff
pub mod retry;
/// Task status state machine
pub mod state_machine;
/// Core domain types
pub mod types;
/// Utility functions
pub mod utils;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use client::{ArtifactSource, ArtifactStream, HttpClient, TaskTransport};
pub use config::{
    Config, DownloadConfig, FileCollisionAction, PollConfig, RetryConfig, SubmitEndpoint,
    UploadLimits,
};
pub use download::{DownloadManager, FileSystemSink, MemorySink, SaveSink, SavedArtifact};
pub use error::{Error, ObservationError, Result};
pub use extractor::{ExtractedDatasets, extract};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use poller::{PollingOrchestrator, ProgressObserver};
pub use state_machine::{Observation, TaskStatusMachine};
pub use types::{
    ArtifactKind, ArtifactRef, DataPoint, Dataset, ProcessingResults, SubmitOptions, Task,
    TaskId, TaskState, UploadFile,
};

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
