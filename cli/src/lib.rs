//! taskdeck-cli library: command handlers exposed for unit tests.

pub mod app;
pub mod commands;
pub mod snapshots;
pub mod task_file;
