//! Batch task files.
//!
//! ```toml
//! name = "Month-end close"
//! concurrency = 2
//!
//! [[agents]]
//! name = "Ledger"
//! type = "accountant"
//!
//! [[tasks]]
//! name = "Analyze vendor invoices"
//! agent = "Ledger"
//! ```

use std::path::Path;

use serde::Deserialize;
use taskdeck_core::api::{create_task, Agent, AgentType, ExecutorError, Task};

const DEFAULT_AGENT_NAME: &str = "Analyst";

#[derive(Debug, Clone, Deserialize)]
pub struct TaskFile {
    #[serde(default = "default_workflow_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

fn default_workflow_name() -> String {
    "batch".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub specialization: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Agent name; the first agent (or a default analyst) when omitted.
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

impl TaskFile {
    pub fn load(path: &Path) -> Result<Self, ExecutorError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExecutorError::TaskFile(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
            .map_err(|e| ExecutorError::TaskFile(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let file: TaskFile = toml::from_str(text).map_err(|e| e.to_string())?;
        if file.tasks.is_empty() {
            return Err("no [[tasks]] defined".to_string());
        }
        Ok(file)
    }

    /// Materialise agents and queued tasks.
    pub fn build(&self) -> Result<(Vec<Agent>, Vec<Task>), ExecutorError> {
        let mut agents: Vec<Agent> = self
            .agents
            .iter()
            .map(|a| Agent::new(a.name.clone(), a.agent_type).with_specialization(&a.specialization))
            .collect();
        if agents.is_empty() {
            agents.push(Agent::new(DEFAULT_AGENT_NAME, AgentType::Analyst));
        }

        let mut tasks = Vec::with_capacity(self.tasks.len());
        for entry in &self.tasks {
            let agent = match entry.agent.as_deref() {
                Some(name) => agents
                    .iter()
                    .find(|a| a.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| {
                        ExecutorError::TaskFile(format!(
                            "task \"{}\" references unknown agent \"{}\"",
                            entry.name, name
                        ))
                    })?,
                None => &agents[0],
            };
            tasks.push(create_task(
                entry.name.clone(),
                entry.description.clone(),
                agent,
                entry.input.clone(),
            ));
        }
        Ok((agents, tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskdeck_core::api::TaskStatus;

    const SAMPLE: &str = r#"
name = "Month-end close"
concurrency = 3

[[agents]]
name = "Ledger"
type = "accountant"

[[agents]]
name = "Scout"
type = "researcher"

[[tasks]]
name = "Analyze vendor invoices"
agent = "ledger"

[[tasks]]
name = "Research new suppliers"
agent = "Scout"
input = "EU only"
"#;

    #[test]
    fn test_build_assigns_agents_and_templates() {
        let file = TaskFile::parse(SAMPLE).unwrap();
        assert_eq!(file.concurrency, Some(3));
        let (agents, tasks) = file.build().unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(tasks[0].agent_name, "Ledger");
        assert_eq!(tasks[0].steps[0].name, "Parsing input data");
        assert_eq!(tasks[1].agent_id, agents[1].id);
        assert_eq!(tasks[1].input.as_deref(), Some("EU only"));
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Queued));
    }

    #[test]
    fn test_default_agent_when_none_declared() {
        let file = TaskFile::parse("[[tasks]]\nname = \"Do the thing\"\n").unwrap();
        let (agents, tasks) = file.build().unwrap();
        assert_eq!(agents[0].name, "Analyst");
        assert_eq!(tasks[0].agent_id, agents[0].id);
        assert_eq!(file.name, "batch");
    }

    #[test]
    fn test_unknown_agent_is_rejected() {
        let file =
            TaskFile::parse("[[tasks]]\nname = \"Orphan\"\nagent = \"Nobody\"\n").unwrap();
        let err = file.build().unwrap_err();
        assert!(err.to_string().contains("unknown agent \"Nobody\""));
    }

    #[test]
    fn test_empty_task_list_is_rejected() {
        assert!(TaskFile::parse("name = \"empty\"\n").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let err = TaskFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("tasks.toml"));
    }
}
