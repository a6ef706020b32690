use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placeholder shipped in sample `.env` / config files; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.execution.validate()?;
        self.ai.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "taskdeck_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Knobs for the simulated driver and the batch scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_min_step_delay_ms")]
    pub min_step_delay_ms: u64,

    #[serde(default = "default_max_step_delay_ms")]
    pub max_step_delay_ms: u64,

    /// Probability in `[0, 1]` that a step fails after its delay.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,

    /// Upper clamp applied to any requested batch concurrency.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_min_step_delay_ms() -> u64 {
    1_000
}

fn default_max_step_delay_ms() -> u64 {
    3_000
}

fn default_failure_rate() -> f64 {
    0.05
}

fn default_concurrency() -> usize {
    2
}

fn default_max_concurrent_tasks() -> usize {
    5
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_step_delay_ms: default_min_step_delay_ms(),
            max_step_delay_ms: default_max_step_delay_ms(),
            failure_rate: default_failure_rate(),
            default_concurrency: default_concurrency(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_step_delay_ms > self.max_step_delay_ms {
            return Err(ConfigError::Invalid {
                field: "execution.min_step_delay_ms",
                reason: format!(
                    "{} is greater than max_step_delay_ms {}",
                    self.min_step_delay_ms, self.max_step_delay_ms
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ConfigError::Invalid {
                field: "execution.failure_rate",
                reason: format!("{} is outside [0, 1]", self.failure_rate),
            });
        }
        if self.max_concurrent_tasks == 0 {
            return Err(ConfigError::Invalid {
                field: "execution.max_concurrent_tasks",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve a requested concurrency against the configured default and cap.
    pub fn effective_concurrency(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_concurrency)
            .clamp(1, self.max_concurrent_tasks.max(1))
    }
}

/// Settings for the OpenAI-compatible content generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Model for extract, report and research requests. Empty falls back
    /// to `model`.
    #[serde(default = "default_ai_detailed_model")]
    pub detailed_model: String,

    #[serde(default = "default_ai_temperature")]
    pub temperature: f32,

    #[serde(default = "default_ai_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_ai_timeout_ms")]
    pub timeout_ms: u64,

    /// Documents longer than this are truncated before generation.
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_detailed_model() -> String {
    "gpt-4o".to_string()
}

fn default_ai_temperature() -> f32 {
    0.7
}

fn default_ai_max_tokens() -> u32 {
    4096
}

fn default_ai_timeout_ms() -> u64 {
    60_000
}

fn default_max_document_chars() -> usize {
    50_000
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            api_key: String::new(),
            model: default_ai_model(),
            detailed_model: default_ai_detailed_model(),
            temperature: default_ai_temperature(),
            max_tokens: default_ai_max_tokens(),
            timeout_ms: default_ai_timeout_ms(),
            max_document_chars: default_max_document_chars(),
        }
    }
}

impl AiConfig {
    pub fn is_api_key_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "ai.base_url",
                reason: format!("must be an http(s) URL, got {}", self.base_url),
            });
        }
        if self.max_document_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "ai.max_document_chars",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// "text" or "jsonl".
    #[serde(default = "default_output_format")]
    pub format: String,
    #[serde(default)]
    pub pretty_print: bool,
    #[serde(default)]
    pub ascii_only: bool,
    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_output_format() -> String {
    "text".to_string()
}

fn default_progress_bar() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            pretty_print: false,
            ascii_only: false,
            progress_bar: default_progress_bar(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_simulation_policy() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.execution.min_step_delay_ms, 1_000);
        assert_eq!(cfg.execution.max_step_delay_ms, 3_000);
        assert!((cfg.execution.failure_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.execution.default_concurrency, 2);
        assert_eq!(cfg.ai.max_document_chars, 50_000);
        assert_eq!(cfg.ai.model, "gpt-4o-mini");
        assert_eq!(cfg.ai.detailed_model, "gpt-4o");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [execution]
            failure_rate = 0.0

            [ai]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.execution.failure_rate, 0.0);
        assert_eq!(cfg.execution.max_step_delay_ms, 3_000);
        assert_eq!(cfg.ai.model, "gpt-4o");
        assert_eq!(cfg.ai.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.output.format, "text");
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut cfg = ExecutionConfig::default();
        cfg.min_step_delay_ms = 5_000;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "execution.min_step_delay_ms", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_failure_rate_out_of_range() {
        let mut cfg = ExecutionConfig::default();
        cfg.failure_rate = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_effective_concurrency_clamps() {
        let cfg = ExecutionConfig::default();
        assert_eq!(cfg.effective_concurrency(None), 2);
        assert_eq!(cfg.effective_concurrency(Some(0)), 1);
        assert_eq!(cfg.effective_concurrency(Some(50)), 5);
    }

    #[test]
    fn test_placeholder_key_is_not_configured() {
        let mut cfg = AiConfig::default();
        assert!(!cfg.is_api_key_configured());
        cfg.api_key = PLACEHOLDER_API_KEY.to_string();
        assert!(!cfg.is_api_key_configured());
        cfg.api_key = "sk-test".to_string();
        assert!(cfg.is_api_key_configured());
    }
}
