use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::{format_duration, stats, TaskStats};
use crate::task::{generate_id, Task, TaskStatus};

/// Change notifications broadcast by the task board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    AgentAdded {
        agent_id: String,
        timestamp: DateTime<Utc>,
    },
    AgentRemoved {
        agent_id: String,
        timestamp: DateTime<Utc>,
    },
    AgentCountersChanged {
        agent_id: String,
        tasks_running: u32,
        tasks_completed: u32,
        tasks_failed: u32,
        efficiency: u32,
        timestamp: DateTime<Utc>,
    },
    TaskAdded {
        task_id: String,
        agent_id: String,
        timestamp: DateTime<Utc>,
    },
    TaskStatusChanged {
        task_id: String,
        old_status: TaskStatus,
        new_status: TaskStatus,
        timestamp: DateTime<Utc>,
    },
    TaskProgress {
        task_id: String,
        progress: u8,
        timestamp: DateTime<Utc>,
    },
    TaskRemoved {
        task_id: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowRecorded {
        workflow_id: String,
        status: WorkflowStatus,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// History entry for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub task_ids: Vec<String>,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub summary: TaskStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl WorkflowRecord {
    /// Summarise the final snapshots of a batch.
    ///
    /// Any task left paused or unfinished marks the run cancelled; otherwise a
    /// single failure marks it failed.
    pub fn from_batch(
        name: impl Into<String>,
        description: impl Into<String>,
        tasks: &[Task],
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let summary = stats(tasks);
        let unfinished = tasks.iter().any(|t| !t.status.is_terminal());
        let status = if unfinished {
            WorkflowStatus::Cancelled
        } else if summary.failed > 0 {
            WorkflowStatus::Failed
        } else {
            WorkflowStatus::Completed
        };

        Self {
            id: generate_id(),
            name: name.into(),
            description: description.into(),
            task_ids: tasks.iter().map(|t| t.id.clone()).collect(),
            status,
            started_at,
            completed_at: Some(Utc::now()),
            duration: Some(format_duration(elapsed)),
            result: Some(format!(
                "{}/{} tasks completed",
                summary.completed, summary.total
            )),
            summary,
        }
    }
}
