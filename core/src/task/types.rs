use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::steps::{generate_ai_steps, generate_steps};
use super::transitions::StepTransition;
use crate::error::ExecutorError;

/// Lifecycle status shared by tasks and steps.
///
/// Steps never use `Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Idle,
    Queued,
    Running,
    Completed,
    Failed,
    Paused,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Paused => "paused",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent persona; selects the system prompt used for AI-backed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Accountant,
    Legal,
    Medical,
    Architect,
    Researcher,
    #[default]
    Analyst,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accountant => "accountant",
            Self::Legal => "legal",
            Self::Medical => "medical",
            Self::Architect => "architect",
            Self::Researcher => "researcher",
            Self::Analyst => "analyst",
        }
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accountant" => Ok(Self::Accountant),
            "legal" => Ok(Self::Legal),
            "medical" => Ok(Self::Medical),
            "architect" => Ok(Self::Architect),
            "researcher" => Ok(Self::Researcher),
            "analyst" => Ok(Self::Analyst),
            other => Err(format!("unknown agent type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    #[default]
    Idle,
    Busy,
    Error,
}

/// Agent configuration plus the counters the task board keeps in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub tasks_failed: u32,
    #[serde(default)]
    pub tasks_running: u32,
    /// Success percentage over finished tasks.
    #[serde(default = "default_efficiency")]
    pub efficiency: u32,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

fn default_efficiency() -> u32 {
    100
}

impl Agent {
    pub fn new(name: impl Into<String>, agent_type: AgentType) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: name.into(),
            agent_type,
            specialization: String::new(),
            status: AgentStatus::Idle,
            tasks_completed: 0,
            tasks_failed: 0,
            tasks_running: 0,
            efficiency: default_efficiency(),
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn with_specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specialization = specialization.into();
        self
    }
}

/// Kind of work an AI-backed task asks the content generator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Summarize,
    Qa,
    Extract,
    Report,
    Research,
    #[default]
    Analyze,
    Chat,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Qa => "qa",
            Self::Extract => "extract",
            Self::Report => "report",
            Self::Research => "research",
            Self::Analyze => "analyze",
            Self::Chat => "chat",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summarize" => Ok(Self::Summarize),
            "qa" => Ok(Self::Qa),
            "extract" => Ok(Self::Extract),
            "report" => Ok(Self::Report),
            "research" => Ok(Self::Research),
            "analyze" => Ok(Self::Analyze),
            "chat" => Ok(Self::Chat),
            other => Err(format!("unknown task type: {}", other)),
        }
    }
}

/// One named phase of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStep {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStep {
    pub fn new(name: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            status,
            started_at: None,
            completed_at: None,
            output: None,
            error: None,
        }
    }
}

/// A schedulable unit of agent work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    pub agent_id: String,
    pub agent_name: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub steps: Vec<TaskStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Formatted elapsed time, set only when the task reaches a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Index of the first step that still has work left.
    pub fn first_incomplete_step(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.status != TaskStatus::Completed)
    }

    /// Index of the step currently marked `running`, if any.
    pub fn running_step(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.status == TaskStatus::Running)
    }

    pub fn running_step_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == TaskStatus::Running)
            .count()
    }

    pub fn completed_step_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == TaskStatus::Completed)
            .count()
    }

    /// Move step `index` to `to`, rejecting transitions the step machine forbids.
    pub fn set_step_status(&mut self, index: usize, to: TaskStatus) -> Result<(), ExecutorError> {
        let total = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(ExecutorError::StepOutOfRange { index, total })?;
        StepTransition::validate(step.status, to)?;
        step.status = to;
        Ok(())
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Build a queued task whose steps come from its name.
pub fn create_task(
    name: impl Into<String>,
    description: impl Into<String>,
    agent: &Agent,
    input: Option<String>,
) -> Task {
    let name = name.into();
    let steps = generate_steps(&name);
    new_task(name, description.into(), agent, steps, input)
}

/// Build a queued task whose steps come from an AI task type.
pub fn create_ai_task(
    name: impl Into<String>,
    description: impl Into<String>,
    agent: &Agent,
    task_type: TaskType,
    input: Option<String>,
) -> Task {
    let steps = generate_ai_steps(task_type);
    new_task(name.into(), description.into(), agent, steps, input)
}

fn new_task(
    name: String,
    description: String,
    agent: &Agent,
    steps: Vec<TaskStep>,
    input: Option<String>,
) -> Task {
    Task {
        id: generate_id(),
        name,
        description,
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        status: TaskStatus::Queued,
        progress: 0,
        steps,
        input,
        output: None,
        error: None,
        started_at: None,
        completed_at: None,
        duration: None,
        created_at: Utc::now(),
    }
}
