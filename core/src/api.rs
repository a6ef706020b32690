//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskdeck_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_taskdeck_data_dir, load_default, load_explicit, load_from_path, AiConfig, AppConfig,
    ExecutionConfig, LoggingConfig, OutputConfig, PLACEHOLDER_API_KEY,
};
pub use crate::error::{
    CliError, ConfigError, ExecutorError, ExtractError, GenerationError, GenerationErrorKind,
};
pub use crate::executor::{
    format_duration, quick_action, run_batch, stats, success_rate, truncate_document, AiDriver,
    AiTaskConfig, AiTaskResult, AiTaskRunner, CancellationRegistry, ChannelObserver, ChatMessage,
    ChatRole, ContentGenerator, DocumentMetadata, FanoutObserver, FnObserver, GenerationKind,
    GenerationRequest, InstantSleeper, NoopObserver, ProcessedDocument, ProgressMonitor,
    QuickAction, RandomSource, Registration, ScriptedRandom, SimulatedDriver, SimulationPolicy,
    Sleeper, TaskEvent, TaskExecutor, TaskObserver, TaskStats, TextExtractor, ThreadRandom,
    TokioSleeper, QUICK_ACTIONS, SIMULATED_STEP_ERROR, TRUNCATION_NOTICE,
};
pub use crate::state::{BoardEvent, TaskBoard, WorkflowRecord, WorkflowStatus};
pub use crate::task::{
    classify, create_ai_task, create_task, generate_ai_steps, generate_id, generate_steps, Agent,
    AgentStatus, AgentType, StepCategory, Task, TaskStatus, TaskStep, TaskType,
};
