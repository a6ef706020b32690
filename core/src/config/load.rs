use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::ConfigError;

/// Get the default taskdeck data directory: ~/.taskdeck
pub fn get_taskdeck_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".taskdeck"))
        .ok_or(ConfigError::NoHomeDir)
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    // Priority 1: ~/.taskdeck/config.toml (highest)
    let home_config = get_taskdeck_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if home_config.exists() {
        load_from_path(&home_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    cfg.validate()?;
    Ok(cfg)
}

/// Load an explicitly named config file, then apply env overrides and validate.
pub fn load_explicit(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut cfg = load_from_path(path)?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let display = path.display().to_string();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// Environment variable overrides (Priority 0: highest).
fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("TASKDECK_API_KEY") {
        cfg.ai.api_key = v;
    }
    if let Some(v) = non_empty("TASKDECK_AI_BASE_URL") {
        cfg.ai.base_url = v;
    }
    if let Some(v) = non_empty("TASKDECK_AI_MODEL") {
        cfg.ai.model = v;
    }
    if let Some(v) = non_empty("TASKDECK_AI_DETAILED_MODEL") {
        cfg.ai.detailed_model = v;
    }
    if let Some(v) = non_empty("TASKDECK_LOG_LEVEL") {
        cfg.logging.level = v;
    }
}
