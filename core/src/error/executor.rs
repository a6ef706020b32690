use thiserror::Error;

use crate::task::TaskStatus;

/// Engine faults raised while driving a task.
///
/// These never cross `execute` / `run_batch`: the driver folds them into a
/// failed task snapshot.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("step index {index} out of range for task with {total} steps")]
    StepOutOfRange { index: usize, total: usize },

    #[error("invalid step transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("cannot move a {state} step")]
    FromTerminalState { state: TaskStatus },

    #[error("execution panicked: {0}")]
    Panicked(String),

    #[error("task file error: {0}")]
    TaskFile(String),
}

impl ExecutorError {
    /// Build from the payload of a caught panic.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "An unexpected error occurred".to_string()
        };
        Self::Panicked(message)
    }
}
