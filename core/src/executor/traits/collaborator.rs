use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, GenerationError};
use crate::task::AgentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// What the generator is asked to produce from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationKind {
    Summarize,
    Answer { question: String },
    Extract { extraction_type: String },
    Report { report_type: String },
    Research { topic: String },
    Chat {
        history: Vec<ChatMessage>,
        message: String,
    },
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Answer { .. } => "answer",
            Self::Extract { .. } => "extract",
            Self::Report { .. } => "report",
            Self::Research { .. } => "research",
            Self::Chat { .. } => "chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    /// Document text, possibly empty.
    pub content: String,
    pub agent_type: AgentType,
}

/// External text-generation capability.
///
/// Errors carry a classified kind; the AI driver surfaces the message
/// verbatim as the task error.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Text pulled out of a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub content: String,
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// External text-extraction capability.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<ProcessedDocument, ExtractError>;
}
