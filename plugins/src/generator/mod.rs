//! Content generators.

pub mod errors;
pub mod openai;
pub mod prompts;

pub use errors::{classify, ApiFailure};
pub use openai::{OpenAiGenerator, EMPTY_COMPLETION};
