//! Task execution engine.
//!
//! ```text
//! create_task() ──► SimulatedDriver::execute ──► TaskObserver::on_update*
//!                     │   ▲                     └► TaskObserver::on_complete
//!                     │   └── CancellationRegistry::pause_task
//!                     ▼
//!               run_batch (bounded workers over a FIFO queue)
//! ```
//!
//! `AiDriver` follows the same observer contract but hands the work to a
//! [`ContentGenerator`] and is not cancellable.

mod ai;
mod driver;
mod observer;
mod progress;
mod registry;
mod scheduler;
mod stats;
pub mod traits;

pub use ai::{
    quick_action, truncate_document, AiDriver, AiTaskConfig, AiTaskResult, AiTaskRunner,
    QuickAction, DEFAULT_MAX_DOCUMENT_CHARS, QUICK_ACTIONS, TRUNCATION_NOTICE,
};
pub use driver::{SimulatedDriver, SimulationPolicy, SIMULATED_STEP_ERROR};
pub use observer::{ChannelObserver, FanoutObserver, FnObserver, TaskEvent};
pub use progress::ProgressMonitor;
pub use registry::{CancellationRegistry, Registration};
pub use scheduler::run_batch;
pub use stats::{format_duration, stats, success_rate, TaskStats};
pub use traits::{
    ChatMessage, ChatRole, ContentGenerator, DocumentMetadata, GenerationKind, GenerationRequest,
    InstantSleeper, NoopObserver, ProcessedDocument, RandomSource, ScriptedRandom, Sleeper,
    TaskExecutor, TaskObserver, TextExtractor, ThreadRandom, TokioSleeper,
};
