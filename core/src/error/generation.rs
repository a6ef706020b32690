use std::fmt;

use thiserror::Error;

/// Coarse classification of content-generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    QuotaExceeded,
    InvalidKey,
    RateLimited,
    Network,
    Unknown,
}

impl GenerationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::InvalidKey => "invalid_key",
            Self::RateLimited => "rate_limit",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a content generator.
///
/// The rendered message (including the details paragraph) is what ends up in
/// `Task::error`, so it is written for end users.
#[derive(Debug, Clone)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Shorthand for request validation failures raised before any call.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Unknown, message)
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(details) = &self.details {
            write!(f, "\n\n{}", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationError {}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("file too large: {path} is {size} bytes (max {max})")]
    TooLarge { path: String, size: u64, max: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_details() {
        let err = GenerationError::invalid_request("Research topic is required");
        assert_eq!(err.to_string(), "Research topic is required");
    }

    #[test]
    fn test_display_with_details() {
        let err = GenerationError::new(GenerationErrorKind::RateLimited, "Slow down.")
            .with_details("Wait a moment.");
        assert_eq!(err.to_string(), "Slow down.\n\nWait a moment.");
        assert_eq!(err.kind.as_str(), "rate_limit");
    }
}
