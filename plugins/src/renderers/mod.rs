//! Observers that print task progress to the terminal.

pub mod jsonl;
pub mod text;

pub use jsonl::JsonlRenderer;
pub use text::TextRenderer;
