//! Polling orchestrator
//!
//! Drives one task from `pending` to a terminal state: poll the status,
//! feed the snapshot through a [`TaskStatusMachine`], report changes, sleep,
//! repeat. The loop is bounded by [`PollConfig::max_attempts`] and can be
//! stopped at any time through its [`CancellationToken`].

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::TaskTransport;
use crate::config::{PollConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::state_machine::TaskStatusMachine;
use crate::types::{ProcessingResults, Task, TaskId, TaskState};

/// Receives every distinct task state observed while polling
///
/// Implemented for any `FnMut(&Task) + Send` closure.
pub trait ProgressObserver: Send {
    /// Called once per changed observation, in poll order
    fn on_progress(&mut self, task: &Task);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&Task) + Send,
{
    fn on_progress(&mut self, task: &Task) {
        self(task)
    }
}

/// Polls a task until it completes, fails, times out or is cancelled
///
/// One orchestrator never issues overlapping polls. Independent orchestrators
/// for different tasks share nothing but the transport.
pub struct PollingOrchestrator<T: TaskTransport + ?Sized> {
    transport: Arc<T>,
    poll: PollConfig,
    retry: RetryConfig,
    cancel: CancellationToken,
}

impl<T: TaskTransport + ?Sized> PollingOrchestrator<T> {
    /// Create an orchestrator with its own cancellation token
    pub fn new(transport: Arc<T>, poll: PollConfig, retry: RetryConfig) -> Self {
        Self {
            transport,
            poll,
            retry,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. a child of a session-wide token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this orchestrator's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of the current run
    ///
    /// An in-flight status request is left to finish; its response is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Poll `task_id` from a fresh `pending` state until it finishes
    ///
    /// # Errors
    ///
    /// - [`Error::Job`] when the server reports `status = error`
    /// - [`Error::Timeout`] when the attempt budget runs out
    /// - [`Error::Cancelled`] when the token fires
    /// - [`Error::Observation`] on an inconsistent status sequence
    /// - any transport error that is not retried
    pub async fn run<O>(&self, task_id: TaskId, mut observer: O) -> Result<ProcessingResults>
    where
        O: ProgressObserver,
    {
        let mut machine = TaskStatusMachine::new(task_id);
        self.run_machine(&mut machine, &mut observer).await
    }

    /// Like [`run`](Self::run), but drives a caller-owned state machine
    ///
    /// The machine keeps the last accepted state after the call returns,
    /// whatever the outcome.
    pub async fn run_machine(
        &self,
        machine: &mut TaskStatusMachine,
        observer: &mut dyn ProgressObserver,
    ) -> Result<ProcessingResults> {
        let task_id = machine.task_id().clone();
        let max_attempts = self.poll.max_attempts;

        tracing::info!(
            task_id = %task_id,
            max_attempts,
            interval_ms = self.poll.interval.as_millis() as u64,
            "polling task"
        );

        for attempt in 1..=max_attempts {
            self.ensure_active(&task_id)?;

            tracing::debug!(task_id = %task_id, attempt, "polling status");
            let polled = self.poll_status(&task_id).await;

            // A response arriving after cancellation must not touch any state
            self.ensure_active(&task_id)?;
            let snapshot = polled?;

            let observation = machine.observe(snapshot)?;
            if observation.changed {
                tracing::debug!(
                    task_id = %task_id,
                    status = %observation.task.status,
                    progress = observation.task.progress,
                    "task progressed"
                );
                observer.on_progress(&observation.task);
            }

            match observation.task.status {
                TaskState::Completed => {
                    tracing::info!(task_id = %task_id, attempts = attempt, "task completed");
                    let results = self.transport.fetch_results(&task_id).await;
                    self.ensure_active(&task_id)?;
                    return results;
                }
                TaskState::Error => {
                    tracing::warn!(
                        task_id = %task_id,
                        message = %observation.task.message,
                        "task failed on the server"
                    );
                    return Err(Error::Job {
                        message: observation.task.message,
                    });
                }
                _ => {}
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        tracing::info!(task_id = %task_id, "polling cancelled");
                        return Err(Error::Cancelled);
                    }
                    _ = tokio::time::sleep(self.poll.interval) => {}
                }
            }
        }

        tracing::warn!(task_id = %task_id, attempts = max_attempts, "polling budget exhausted");
        Err(Error::Timeout {
            attempts: max_attempts,
        })
    }

    fn ensure_active(&self, task_id: &TaskId) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::info!(task_id = %task_id, "polling cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// One logical poll, retried according to [`RetryConfig`]
    async fn poll_status(&self, task_id: &TaskId) -> Result<Task> {
        let transport = &self.transport;
        let request_timeout = self.poll.request_timeout;

        with_retry(&self.retry, move || async move {
            match request_timeout {
                Some(timeout) => tokio::time::timeout(timeout, transport.get_status(task_id))
                    .await
                    .map_err(|_| Error::RequestTimeout { timeout })?,
                None => transport.get_status(task_id).await,
            }
        })
        .await
    }
}
