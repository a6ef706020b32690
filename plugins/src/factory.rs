use std::sync::Arc;

use anyhow::Result;

use taskdeck_core::api::{
    AiConfig, AiDriver, AppConfig, CancellationRegistry, ContentGenerator, ExecutionConfig,
    OutputConfig, SimulatedDriver, SimulationPolicy, TaskObserver, TextExtractor,
};

use crate::extractor::FileTextExtractor;
use crate::generator::OpenAiGenerator;
use crate::renderers::{JsonlRenderer, TextRenderer};

pub fn build_generator(cfg: &AiConfig) -> Result<Arc<dyn ContentGenerator>> {
    if !cfg.is_api_key_configured() {
        tracing::warn!(
            target: "taskdeck.ai",
            "no API key configured; AI tasks will fail until one is set"
        );
    }
    Ok(Arc::new(OpenAiGenerator::new(cfg)?))
}

pub fn build_extractor() -> Arc<dyn TextExtractor> {
    Arc::new(FileTextExtractor::new())
}

pub fn build_simulated_driver(
    cfg: &ExecutionConfig,
    registry: CancellationRegistry,
) -> SimulatedDriver {
    SimulatedDriver::new(registry).with_policy(SimulationPolicy::from(cfg))
}

pub fn build_ai_driver(cfg: &AppConfig) -> Result<AiDriver> {
    let generator = build_generator(&cfg.ai)?;
    Ok(AiDriver::new(generator, build_extractor())
        .with_max_document_chars(cfg.ai.max_document_chars))
}

/// `progress_bars` suppresses per-step text lines while bars are drawn.
pub fn build_renderer(cfg: &OutputConfig, progress_bars: bool) -> Box<dyn TaskObserver> {
    match cfg.format.as_str() {
        "jsonl" => Box::new(JsonlRenderer::new(cfg.pretty_print)),
        // Anything other than jsonl renders as text.
        _ if progress_bars => Box::new(TextRenderer::new(cfg.ascii_only).completions_only()),
        _ => Box::new(TextRenderer::new(cfg.ascii_only)),
    }
}
