#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod generation;

pub use error::{CliError, ConfigError};
pub use executor::ExecutorError;
pub use generation::{ExtractError, GenerationError, GenerationErrorKind};
