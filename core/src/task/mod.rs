//! Task and step data model.
//!
//! A [`Task`] owns an ordered list of [`TaskStep`]s generated once at creation
//! time by the step sequencer; drivers only ever change step statuses and
//! timestamps, never the list itself.

mod steps;
mod transitions;
mod types;

pub use steps::{classify, generate_ai_steps, generate_steps, StepCategory, CLASSIFICATION_RULES};
pub use transitions::StepTransition;
pub use types::{
    create_ai_task, create_task, generate_id, Agent, AgentStatus, AgentType, TaskType, Task,
    TaskStatus, TaskStep,
};
