//! Session facade: submit a document, follow it to completion, extract datasets
//!
//! A [`Pipeline`] owns at most one active run. Retrying re-submits the last
//! upload and therefore always produces a new task id; the failed task is
//! left as it was.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::{ArtifactSource, HttpClient, TaskTransport};
use crate::config::Config;
use crate::download::{DownloadManager, SaveSink};
use crate::error::{Error, Result};
use crate::extractor::{ExtractedDatasets, extract};
use crate::poller::{PollingOrchestrator, ProgressObserver};
use crate::state_machine::TaskStatusMachine;
use crate::types::{ProcessingResults, SubmitOptions, Task, UploadFile};
use crate::utils::validate_upload;

/// Everything a finished run produced
#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    /// Final (terminal) state of the task
    pub task: Task,
    /// Results fetched once the task completed
    pub results: ProcessingResults,
    /// Datasets extracted from the OCR text
    ///
    /// `None` when there was no text to extract from. `Some` with empty
    /// datasets when extraction ran and found nothing recognizable.
    pub datasets: Option<ExtractedDatasets>,
}

/// Cancellation handle of the run in progress
struct ActiveRun {
    id: u64,
    token: CancellationToken,
}

/// Last upload, kept so it can be re-submitted
#[derive(Clone)]
struct Submission {
    file: UploadFile,
    options: SubmitOptions,
}

/// Drives one document at a time through the service
pub struct Pipeline<T: TaskTransport + ?Sized = HttpClient> {
    transport: Arc<T>,
    config: Config,
    active: Mutex<Option<ActiveRun>>,
    next_run_id: AtomicU64,
    last_submission: Mutex<Option<Submission>>,
}

impl Pipeline<HttpClient> {
    /// Create a pipeline talking HTTP to `config.base_url`
    pub fn new(config: Config) -> Result<Self> {
        let client = HttpClient::new(&config)?;
        Ok(Self::with_transport(Arc::new(client), config))
    }
}

impl<T: TaskTransport + ?Sized> Pipeline<T> {
    /// Create a pipeline over any transport
    pub fn with_transport(transport: Arc<T>, config: Config) -> Self {
        Self {
            transport,
            config,
            active: Mutex::new(None),
            next_run_id: AtomicU64::new(0),
            last_submission: Mutex::new(None),
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Submit `file` and follow it until it finishes
    ///
    /// `options` default to the configured query and description flag.
    pub async fn process<O>(
        &self,
        file: UploadFile,
        options: Option<SubmitOptions>,
        mut observer: O,
    ) -> Result<PipelineOutcome>
    where
        O: ProgressObserver,
    {
        validate_upload(&file, &self.config.upload)?;
        let submission = Submission {
            file,
            options: options.unwrap_or_else(|| self.config.default_submit_options()),
        };
        *self.last_submission.lock().await = Some(submission.clone());
        self.run_submission(&submission, &mut observer).await
    }

    /// Read a file from disk and [`process`](Self::process) it
    pub async fn process_path<O>(
        &self,
        path: impl AsRef<Path>,
        options: Option<SubmitOptions>,
        observer: O,
    ) -> Result<PipelineOutcome>
    where
        O: ProgressObserver,
    {
        let file = UploadFile::from_path(path).await?;
        self.process(file, options, observer).await
    }

    /// Re-submit the last upload as a brand-new task
    pub async fn retry<O>(&self, mut observer: O) -> Result<PipelineOutcome>
    where
        O: ProgressObserver,
    {
        let submission = self
            .last_submission
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::InvalidUpload {
                reason: "nothing has been submitted yet, nothing to retry".to_string(),
            })?;

        tracing::info!(file = %submission.file.file_name, "retrying as a new task");
        self.run_submission(&submission, &mut observer).await
    }

    /// Cancel the active run, if any
    ///
    /// The run fails with [`Error::Cancelled`]; a status response already in
    /// flight is discarded.
    pub async fn cancel(&self) {
        if let Some(run) = self.active.lock().await.as_ref() {
            tracing::info!(run_id = run.id, "cancelling active run");
            run.token.cancel();
        }
    }

    /// Wait for SIGINT/SIGTERM, then cancel the active run
    pub async fn cancel_on_shutdown_signal(&self) {
        crate::wait_for_signal().await;
        self.cancel().await;
    }

    async fn run_submission(
        &self,
        submission: &Submission,
        observer: &mut dyn ProgressObserver,
    ) -> Result<PipelineOutcome> {
        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let run = ActiveRun {
            id,
            token: token.clone(),
        };
        // Only one run is active per pipeline; a new one supersedes the old
        if let Some(previous) = self.active.lock().await.replace(run) {
            previous.token.cancel();
        }

        let outcome = self.follow(submission, observer, token).await;

        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|run| run.id == id) {
            *active = None;
        }
        outcome
    }

    async fn follow(
        &self,
        submission: &Submission,
        observer: &mut dyn ProgressObserver,
        token: CancellationToken,
    ) -> Result<PipelineOutcome> {
        let receipt = self
            .transport
            .submit(&submission.file, &submission.options)
            .await?;
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut machine = TaskStatusMachine::new(receipt.task_id);
        let orchestrator = PollingOrchestrator::new(
            self.transport.clone(),
            self.config.poll.clone(),
            self.config.retry.clone(),
        )
        .with_cancellation(token);

        let results = orchestrator.run_machine(&mut machine, observer).await?;
        let datasets = results.extractable_text().map(extract);

        Ok(PipelineOutcome {
            task: machine.current().clone(),
            results,
            datasets,
        })
    }
}

impl<T: TaskTransport + ArtifactSource + ?Sized> Pipeline<T> {
    /// Download manager sharing this pipeline's transport
    pub fn downloads<K: SaveSink + ?Sized>(&self, sink: Arc<K>) -> DownloadManager<T, K> {
        DownloadManager::new(self.transport.clone(), sink)
    }
}
