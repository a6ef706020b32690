use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use taskdeck_core::api::{AgentType, TaskType};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Accountant,
    Legal,
    Medical,
    Architect,
    Researcher,
    Analyst,
}

impl From<AgentKind> for AgentType {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Accountant => AgentType::Accountant,
            AgentKind::Legal => AgentType::Legal,
            AgentKind::Medical => AgentType::Medical,
            AgentKind::Architect => AgentType::Architect,
            AgentKind::Researcher => AgentType::Researcher,
            AgentKind::Analyst => AgentType::Analyst,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiKind {
    Summarize,
    Qa,
    Extract,
    Report,
    Research,
    Analyze,
    Chat,
}

impl From<AiKind> for TaskType {
    fn from(kind: AiKind) -> Self {
        match kind {
            AiKind::Summarize => TaskType::Summarize,
            AiKind::Qa => TaskType::Qa,
            AiKind::Extract => TaskType::Extract,
            AiKind::Report => TaskType::Report,
            AiKind::Research => TaskType::Research,
            AiKind::Analyze => TaskType::Analyze,
            AiKind::Chat => TaskType::Chat,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskdeck", version, about = "Run multi-step agent tasks")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.taskdeck/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text or jsonl. Overrides `output.format`.
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Disable progress bars.
    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AgentArgs {
    #[arg(long, default_value = "Analyst")]
    pub agent_name: String,

    #[arg(long, value_enum, default_value_t = AgentKind::Analyst)]
    pub agent_type: AgentKind,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SimulationArgs {
    /// Probability in [0, 1] that a step fails.
    #[arg(long)]
    pub failure_rate: Option<f64>,

    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    #[arg(long)]
    pub max_delay_ms: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Task name; its keywords pick the step template.
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[command(flatten)]
    pub simulation: SimulationArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    /// TOML file listing agents and tasks.
    pub file: PathBuf,

    /// Number of tasks driven at once. Clamped to `execution.max_concurrent_tasks`.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub simulation: SimulationArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AiArgs {
    #[arg(long = "type", value_enum, default_value_t = AiKind::Summarize)]
    pub task_type: AiKind,

    /// Document to read (text, markdown, csv, json, pdf).
    #[arg(long, group = "document")]
    pub file: Option<PathBuf>,

    /// Document text given inline.
    #[arg(long, group = "document")]
    pub text: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub question: Option<String>,

    #[arg(long)]
    pub extraction_type: Option<String>,

    #[arg(long)]
    pub report_type: Option<String>,

    #[arg(long)]
    pub topic: Option<String>,

    /// Chat message (for --type chat).
    #[arg(long)]
    pub message: Option<String>,

    #[command(flatten)]
    pub agent: AgentArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StepsArgs {
    /// Task name to classify.
    #[arg(required_unless_present = "ai_type")]
    pub name: Option<String>,

    /// Show the step plan of an AI task type instead.
    #[arg(long, value_enum)]
    pub ai_type: Option<AiKind>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StatsArgs {
    /// JSONL file written by `--format jsonl`.
    pub events: PathBuf,

    /// Print the summary as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulated task.
    Run(RunArgs),
    /// Run every task of a task file under the batch scheduler.
    Batch(BatchArgs),
    /// Run an AI-backed task against the configured generator.
    Ai(AiArgs),
    /// Print the step plan for a task name or AI task type.
    Steps(StepsArgs),
    /// Summarise a recorded JSONL event stream.
    Stats(StatsArgs),
}
