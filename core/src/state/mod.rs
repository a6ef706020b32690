//! In-memory task board.
//!
//! Holds the latest snapshot of every task, the agents they run against and a
//! history of batch runs. All changes are published on a broadcast channel.

mod board;
mod types;

pub use board::TaskBoard;
pub use types::{BoardEvent, WorkflowRecord, WorkflowStatus};
