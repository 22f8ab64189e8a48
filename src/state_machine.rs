//! Task status state machine
//!
//! [`TaskStatusMachine`] tracks the externally visible state of one task while
//! status snapshots stream in from the service. It is the only place that
//! decides whether a snapshot may be applied:
//!
//! - progress never goes backwards; a lower value is a transient glitch and the
//!   higher value is kept, while the snapshot's message and step are still shown
//! - a non-terminal snapshot older than the current stage is stale and ignored
//! - once a task is terminal it is frozen; a snapshot moving it to any other
//!   state is an [`ObservationError::TerminalRegression`]
//!
//! The machine is synchronous and performs no I/O.

use crate::error::ObservationError;
use crate::types::{Task, TaskId, TaskState};

/// Message attached to the locally-created `pending` task
const SUBMITTED_MESSAGE: &str = "submitted, waiting for first status";

/// Outcome of feeding one snapshot to the machine
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Externally visible task after the snapshot was applied
    pub task: Task,
    /// Whether status, progress or message differ from the last emitted observation
    pub changed: bool,
    /// Whether the snapshot was (partially) disregarded as stale
    pub stale: bool,
}

/// Visible fields that decide whether an observation is re-emitted
#[derive(Debug, Clone, PartialEq)]
struct EmittedKey {
    status: TaskState,
    progress: u8,
    message: String,
}

impl EmittedKey {
    fn of(task: &Task) -> Self {
        Self {
            status: task.status,
            progress: task.progress,
            message: task.message.clone(),
        }
    }
}

/// State machine for a single task id
#[derive(Debug, Clone)]
pub struct TaskStatusMachine {
    current: Task,
    last_emitted: Option<EmittedKey>,
    server_seen: bool,
}

impl TaskStatusMachine {
    /// Start tracking a freshly submitted task in the local `pending` state
    pub fn new(task_id: TaskId) -> Self {
        Self {
            current: Task::pending(task_id, SUBMITTED_MESSAGE),
            last_emitted: None,
            server_seen: false,
        }
    }

    /// Task id this machine tracks
    pub fn task_id(&self) -> &TaskId {
        &self.current.id
    }

    /// Externally visible task state
    pub fn current(&self) -> &Task {
        &self.current
    }

    /// Whether the tracked task reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Apply one snapshot from the service
    ///
    /// # Errors
    ///
    /// - [`ObservationError::TaskMismatch`] if the snapshot is for another task
    /// - [`ObservationError::TerminalRegression`] if the task is terminal and the
    ///   snapshot reports a different state
    pub fn observe(&mut self, snapshot: Task) -> Result<Observation, ObservationError> {
        if snapshot.id != self.current.id {
            return Err(ObservationError::TaskMismatch {
                expected: self.current.id.clone(),
                actual: snapshot.id,
            });
        }

        if self.current.is_terminal() {
            if snapshot.status != self.current.status {
                tracing::error!(
                    task_id = %self.current.id,
                    from = %self.current.status,
                    to = %snapshot.status,
                    "terminal task reported a new state"
                );
                return Err(ObservationError::TerminalRegression {
                    task_id: self.current.id.clone(),
                    from: self.current.status,
                    to: snapshot.status,
                });
            }
            // Terminal tasks are immutable
            return Ok(self.emit(true));
        }

        if snapshot.status.rank() < self.current.status.rank() {
            tracing::warn!(
                task_id = %self.current.id,
                current = %self.current.status,
                reported = %snapshot.status,
                "ignoring stale status snapshot"
            );
            return Ok(self.emit(true));
        }

        let mut stale = false;
        let progress = if snapshot.progress < self.current.progress {
            if snapshot.status == self.current.status {
                tracing::warn!(
                    task_id = %self.current.id,
                    status = %snapshot.status,
                    kept = self.current.progress,
                    reported = snapshot.progress,
                    "progress went backwards, keeping previous value"
                );
                stale = true;
            }
            self.current.progress
        } else {
            snapshot.progress
        };

        let created_at = if self.server_seen {
            self.current.created_at
        } else {
            snapshot.created_at
        };
        let updated_at = snapshot.updated_at.max(created_at);

        self.current = Task {
            id: snapshot.id,
            status: snapshot.status,
            progress,
            current_step: snapshot.current_step,
            message: snapshot.message,
            created_at,
            updated_at,
            has_results: snapshot.has_results,
        };
        self.server_seen = true;

        Ok(self.emit(stale))
    }

    fn emit(&mut self, stale: bool) -> Observation {
        let key = EmittedKey::of(&self.current);
        let changed = self.last_emitted.as_ref() != Some(&key);
        if changed {
            self.last_emitted = Some(key);
        }
        Observation {
            task: self.current.clone(),
            changed,
            stale,
        }
    }
}
