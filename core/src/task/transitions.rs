//! Step status transition rules.

use super::types::TaskStatus;
use crate::error::ExecutorError;

pub struct StepTransition;

impl StepTransition {
    /// Validate a step status change.
    ///
    /// Re-asserting the current status is accepted. A `failed` step may be
    /// started again when a task is resumed; a `completed` step never moves.
    pub fn validate(from: TaskStatus, to: TaskStatus) -> Result<(), ExecutorError> {
        if from == to {
            return Ok(());
        }

        if from == TaskStatus::Completed {
            return Err(ExecutorError::FromTerminalState { state: from });
        }

        let is_valid = match (from, to) {
            // Steps never carry the task-level paused status.
            (_, TaskStatus::Paused) | (TaskStatus::Paused, _) => false,

            (TaskStatus::Idle, TaskStatus::Queued) => true,
            (TaskStatus::Idle | TaskStatus::Queued, TaskStatus::Running) => true,

            // Driven by coarse progress in the AI-backed path.
            (TaskStatus::Idle | TaskStatus::Queued, TaskStatus::Completed) => true,

            (TaskStatus::Running, TaskStatus::Completed | TaskStatus::Failed) => true,

            // Pause reverts the in-flight step.
            (TaskStatus::Queued | TaskStatus::Running | TaskStatus::Failed, TaskStatus::Idle) => {
                true
            }

            (TaskStatus::Failed, TaskStatus::Running) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(ExecutorError::InvalidTransition { from, to })
        }
    }
}
