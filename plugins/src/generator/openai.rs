use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskdeck_core::api::{
    AiConfig, ChatMessage, ContentGenerator, GenerationError, GenerationErrorKind,
    GenerationRequest,
};

use super::errors::{self, MISSING_KEY_MESSAGE};
use super::prompts;

pub const EMPTY_COMPLETION: &str = "No response generated.";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Content generator backed by an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiGenerator {
    http: reqwest::Client,
    url_completions: String,
    api_key: Option<String>,
    model: String,
    detailed_model: String,
    chat_temperature: f32,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()?;
        let normalized = cfg.base_url.trim_end_matches('/');
        let api_key = cfg
            .is_api_key_configured()
            .then(|| cfg.api_key.trim().to_string());
        Ok(Self {
            http,
            url_completions: format!("{}/chat/completions", normalized),
            api_key,
            model: cfg.model.clone(),
            detailed_model: cfg.detailed_model.clone(),
            chat_temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a prepared message list and return the first completion's text.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerationError::new(
                GenerationErrorKind::InvalidKey,
                MISSING_KEY_MESSAGE,
            ));
        };

        let url = &self.url_completions;
        tracing::debug!(
            target: "taskdeck.http",
            stage = "openai.completions.in",
            url = %url,
            model = %model,
            messages = messages.len(),
            temperature = temperature
        );

        let body = CompletionRequest {
            model,
            messages,
            temperature,
            max_tokens: self.max_tokens,
        };
        let resp = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(target: "taskdeck.http", stage = "openai.completions.send", error = %err);
                errors::from_reqwest(&err)
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|err| errors::from_reqwest(&err))?;

        if !status.is_success() {
            tracing::warn!(
                target: "taskdeck.http",
                stage = "openai.completions.status",
                status = %status,
                body = %errors::preview_body(&text)
            );
            return Err(errors::from_status(status.as_u16(), &text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text).map_err(|err| {
            GenerationError::new(
                GenerationErrorKind::Unknown,
                format!("failed to decode completion response: {}", err),
            )
        })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                target: "taskdeck.http",
                stage = "openai.completions.out",
                status = %status,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens
            );
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION.to_string());
        Ok(content)
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let messages = prompts::build_messages(request);
        let temperature = prompts::temperature_for(&request.kind, self.chat_temperature);
        let model = prompts::model_for(&request.kind, &self.model, &self.detailed_model);
        self.complete(model, &messages, temperature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use taskdeck_core::api::{AgentType, GenerationKind};

    fn config(base_url: String, api_key: &str) -> AiConfig {
        AiConfig {
            base_url,
            api_key: api_key.to_string(),
            timeout_ms: 2_000,
            ..AiConfig::default()
        }
    }

    fn summarize() -> GenerationRequest {
        GenerationRequest {
            kind: GenerationKind::Summarize,
            content: "Quarterly revenue grew 12%.".to_string(),
            agent_type: AgentType::Accountant,
        }
    }

    #[tokio::test]
    async fn test_generate_posts_chat_completion() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.3,
                "max_tokens": 4096
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Revenue is up."}}],"usage":{"prompt_tokens":10,"completion_tokens":4,"total_tokens":14}}"#,
            )
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(&config(server.url(), "sk-test")).unwrap();
        let out = generator.generate(&summarize()).await.unwrap();
        assert_eq!(out, "Revenue is up.");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_extract_uses_detailed_model() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "temperature": 0.2
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"{}"}}]}"#)
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(&config(server.url(), "sk-test")).unwrap();
        let request = GenerationRequest {
            kind: GenerationKind::Extract {
                extraction_type: "invoice".to_string(),
            },
            ..summarize()
        };
        assert_eq!(generator.generate(&request).await.unwrap(), "{}");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_choices_yield_placeholder() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(&config(server.url(), "sk-test")).unwrap();
        let out = generator.generate(&summarize()).await.unwrap();
        assert_eq!(out, EMPTY_COMPLETION);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let generator =
            OpenAiGenerator::new(&config(server.url(), "your_openai_api_key_here")).unwrap();
        assert!(!generator.is_configured());
        let err = generator.generate(&summarize()).await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::InvalidKey);
        assert!(err.to_string().starts_with("OpenAI API key not configured"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_errors_are_classified() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#)
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(&config(server.url(), "sk-bad")).unwrap();
        let err = generator.generate(&summarize()).await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::InvalidKey);
        assert_eq!(
            err.to_string(),
            "Invalid API key. Please check your OpenAI API key.\n\nVerify the configured API key and ensure it's active at platform.openai.com/api-keys"
        );
    }

    #[tokio::test]
    async fn test_too_many_requests_reports_quota() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(&config(server.url(), "sk-test")).unwrap();
        let err = generator.generate(&summarize()).await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Nothing listens on port 9 (discard) in the test environment.
        let generator =
            OpenAiGenerator::new(&config("http://127.0.0.1:9".to_string(), "sk-test")).unwrap();
        let err = generator.generate(&summarize()).await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::Network);
    }
}
