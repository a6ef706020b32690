//! AI-backed execution: delegates content production to a [`ContentGenerator`]
//! and maps its coarse progress onto the task's steps.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::driver::{finish, notify_guarded};
use super::traits::{
    ChatMessage, ContentGenerator, GenerationKind, GenerationRequest, TaskExecutor, TaskObserver,
    TextExtractor,
};
use crate::error::ExecutorError;
use crate::task::{Agent, Task, TaskStatus, TaskType};

pub const TRUNCATION_NOTICE: &str = "\n\n[Document truncated for processing]";
pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 50_000;

const FALLBACK_ERROR: &str = "An error occurred during AI processing";

/// Inputs for one AI-backed task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiTaskConfig {
    pub task_type: TaskType,
    #[serde(default)]
    pub document_content: Option<String>,
    /// Read through the extractor when `document_content` is empty.
    #[serde(default)]
    pub document_path: Option<PathBuf>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub extraction_type: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub research_topic: Option<String>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

impl AiTaskConfig {
    pub fn new(task_type: TaskType) -> Self {
        Self {
            task_type,
            ..Self::default()
        }
    }

    fn generation_kind(&self) -> anyhow::Result<(GenerationKind, &'static str)> {
        let kind = match self.task_type {
            TaskType::Summarize => (GenerationKind::Summarize, "Generating summary..."),
            TaskType::Qa => {
                let question = non_blank(&self.question)
                    .ok_or_else(|| anyhow::anyhow!("Question is required for Q&A tasks"))?;
                (
                    GenerationKind::Answer { question },
                    "Analyzing document for answer...",
                )
            }
            TaskType::Extract => (
                GenerationKind::Extract {
                    extraction_type: non_blank(&self.extraction_type)
                        .unwrap_or_else(|| "general".to_string()),
                },
                "Extracting structured data...",
            ),
            TaskType::Report => (
                GenerationKind::Report {
                    report_type: non_blank(&self.report_type)
                        .unwrap_or_else(|| "analysis".to_string()),
                },
                "Generating report...",
            ),
            TaskType::Research => {
                let topic = non_blank(&self.research_topic)
                    .ok_or_else(|| anyhow::anyhow!("Research topic is required"))?;
                (GenerationKind::Research { topic }, "Conducting research...")
            }
            TaskType::Chat => (
                GenerationKind::Chat {
                    history: self.chat_history.clone(),
                    message: self.question.clone().unwrap_or_default(),
                },
                "Processing conversation...",
            ),
            TaskType::Analyze => (GenerationKind::Summarize, "Analyzing content..."),
        };
        Ok(kind)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTaskResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Canned AI task presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub name: &'static str,
    pub task_type: TaskType,
    pub description: &'static str,
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        name: "Summarize Document",
        task_type: TaskType::Summarize,
        description: "Generate a comprehensive summary of the document",
    },
    QuickAction {
        name: "Extract Data",
        task_type: TaskType::Extract,
        description: "Extract structured data from the document",
    },
    QuickAction {
        name: "Analyze Content",
        task_type: TaskType::Analyze,
        description: "Perform detailed analysis of the content",
    },
    QuickAction {
        name: "Generate Report",
        task_type: TaskType::Report,
        description: "Create a professional report from the data",
    },
];

pub fn quick_action(task_type: TaskType) -> Option<&'static QuickAction> {
    QUICK_ACTIONS.iter().find(|a| a.task_type == task_type)
}

/// Cut `content` to `max_chars` characters, appending the truncation notice.
pub fn truncate_document(content: String, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = content;
            out.truncate(cut);
            out.push_str(TRUNCATION_NOTICE);
            out
        }
        None => content,
    }
}

pub struct AiDriver {
    generator: Arc<dyn ContentGenerator>,
    extractor: Arc<dyn TextExtractor>,
    max_document_chars: usize,
}

impl AiDriver {
    pub fn new(generator: Arc<dyn ContentGenerator>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            generator,
            extractor,
            max_document_chars: DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }

    pub fn with_max_document_chars(mut self, max_document_chars: usize) -> Self {
        self.max_document_chars = max_document_chars;
        self
    }

    /// Produce output for `config`, reporting `(percent, label)` milestones.
    ///
    /// Never fails; errors come back in [`AiTaskResult::error`].
    pub async fn execute_ai_task<F>(
        &self,
        config: &AiTaskConfig,
        agent: &Agent,
        mut on_progress: F,
    ) -> AiTaskResult
    where
        F: FnMut(u8, &str) + Send,
    {
        match self.generate(config, agent, &mut on_progress).await {
            Ok(output) => AiTaskResult {
                success: true,
                output,
                error: None,
            },
            Err(err) => {
                tracing::warn!(
                    target: "taskdeck.ai",
                    task_type = config.task_type.as_str(),
                    error = %err,
                    "ai task failed"
                );
                let message = err.to_string();
                AiTaskResult {
                    success: false,
                    output: String::new(),
                    error: Some(if message.is_empty() {
                        FALLBACK_ERROR.to_string()
                    } else {
                        message
                    }),
                }
            }
        }
    }

    async fn generate<F>(
        &self,
        config: &AiTaskConfig,
        agent: &Agent,
        on_progress: &mut F,
    ) -> anyhow::Result<String>
    where
        F: FnMut(u8, &str) + Send,
    {
        let mut content = config.document_content.clone().unwrap_or_default();

        if content.is_empty() {
            if let Some(path) = &config.document_path {
                on_progress(10, "Extracting document content...");
                let doc = self.extractor.extract(path).await?;
                tracing::debug!(
                    target: "taskdeck.ai",
                    path = %path.display(),
                    words = doc.word_count,
                    "document extracted"
                );
                content = doc.content;
            }
        }

        let content = truncate_document(content, self.max_document_chars);

        on_progress(30, "Processing with AI...");
        let (kind, label) = config.generation_kind()?;
        on_progress(50, label);

        let request = GenerationRequest {
            kind,
            content,
            agent_type: agent.agent_type,
        };
        tracing::debug!(
            target: "taskdeck.ai",
            generator = self.generator.name(),
            kind = request.kind.as_str(),
            chars = request.content.len()
        );
        let output = self.generator.generate(&request).await?;

        on_progress(90, "Finalizing results...");
        Ok(output)
    }

    /// Run `task` against the generator, emitting snapshots as steps advance.
    ///
    /// Not cancellable. On failure steps keep whatever progress they reached.
    pub async fn execute_with_progress(
        &self,
        task: Task,
        config: &AiTaskConfig,
        agent: &Agent,
        observer: &dyn TaskObserver,
    ) -> Task {
        let started = Instant::now();
        let mut current = task;
        current.status = TaskStatus::Running;
        current.error = None;
        current.output = None;
        current.completed_at = None;
        current.duration = None;
        if current.started_at.is_none() {
            current.started_at = Some(Utc::now());
        }

        let outcome = AssertUnwindSafe(async {
            observer.on_update(&current);
            mark_step(&mut current, 0, TaskStatus::Running, observer);
            self.execute_ai_task(config, agent, |percent, label| {
                tracing::trace!(target: "taskdeck.ai", percent, label);
                apply_progress(&mut current, percent, observer);
            })
            .await
        })
        .catch_unwind()
        .await;

        match outcome {
            Ok(result) if result.success => {
                let now = Utc::now();
                for step in current.steps.iter_mut() {
                    step.started_at.get_or_insert(now);
                    step.status = TaskStatus::Completed;
                    step.completed_at = Some(now);
                }
                current.status = TaskStatus::Completed;
                current.progress = 100;
                current.output = Some(result.output);
            }
            Ok(result) => {
                current.status = TaskStatus::Failed;
                current.error = Some(result.error.unwrap_or_else(|| FALLBACK_ERROR.to_string()));
            }
            Err(payload) => {
                let err = ExecutorError::from_panic(payload);
                tracing::error!(target: "taskdeck.ai", task_id = %current.id, error = %err, "ai execution aborted");
                current.status = TaskStatus::Failed;
                current.error = Some(err.to_string());
            }
        }

        finish(&mut current, started);
        tracing::info!(
            target: "taskdeck.ai",
            task_id = %current.id,
            status = %current.status,
            duration = ?current.duration
        );
        notify_guarded(&current, "on_update", || observer.on_update(&current));
        notify_guarded(&current, "on_complete", || observer.on_complete(&current));
        current
    }
}

/// Complete every step before the one `percent` points at, then start it.
fn apply_progress(task: &mut Task, percent: u8, observer: &dyn TaskObserver) {
    let total = task.steps.len();
    if total == 0 {
        return;
    }
    let index = ((f64::from(percent) / 100.0 * total as f64).floor() as usize).min(total - 1);

    for i in 0..index {
        if task.steps[i].status != TaskStatus::Completed {
            mark_step(task, i, TaskStatus::Completed, observer);
        }
    }
    if !matches!(
        task.steps[index].status,
        TaskStatus::Completed | TaskStatus::Running
    ) {
        mark_step(task, index, TaskStatus::Running, observer);
    }
}

fn mark_step(task: &mut Task, index: usize, status: TaskStatus, observer: &dyn TaskObserver) {
    let total = task.steps.len();
    if let Err(err) = task.set_step_status(index, status) {
        tracing::warn!(target: "taskdeck.ai", task_id = %task.id, step = index, error = %err, "step update skipped");
        return;
    }

    let now = Utc::now();
    let step = &mut task.steps[index];
    step.started_at.get_or_insert(now);
    if status == TaskStatus::Completed {
        step.completed_at = Some(now);
    }

    let progress = (((index + 1) as f64 / total as f64) * 80.0).round() as u8;
    task.progress = task.progress.max(progress);
    observer.on_update(task);
}

/// Binds an [`AiDriver`] to one configuration so it can run under the
/// batch scheduler.
pub struct AiTaskRunner {
    driver: Arc<AiDriver>,
    config: AiTaskConfig,
    agent: Agent,
}

impl AiTaskRunner {
    pub fn new(driver: Arc<AiDriver>, config: AiTaskConfig, agent: Agent) -> Self {
        Self {
            driver,
            config,
            agent,
        }
    }
}

#[async_trait]
impl TaskExecutor for AiTaskRunner {
    async fn execute(&self, task: Task, observer: &dyn TaskObserver) -> Task {
        self.driver
            .execute_with_progress(task, &self.config, &self.agent, observer)
            .await
    }
}
