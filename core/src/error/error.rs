use thiserror::Error;

use super::executor::ExecutorError;

/// Errors surfaced at the binary boundary.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// 11: config error, 20: io / command error, 50: internal.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 11,
            Self::Io(_) | Self::Command(_) => 20,
            Self::Executor(_) | Self::Anyhow(_) => 50,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot determine home directory")]
    NoHomeDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
