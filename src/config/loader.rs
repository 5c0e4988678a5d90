//! Load model config from a JSON string, a JSON file, or the `COUCH_MODEL_CONFIG` env var.

use crate::config::ModelConfig;
use crate::error::ConfigError;
use std::path::Path;

/// Env var naming the model config file.
pub const CONFIG_ENV: &str = "COUCH_MODEL_CONFIG";

pub fn load_from_str(json: &str) -> Result<ModelConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_from_file(path: impl AsRef<Path>) -> Result<ModelConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&raw)
}

/// Reads the file named by `COUCH_MODEL_CONFIG`. Unset means an empty config (no views, no REST surface).
pub async fn load_from_env() -> Result<ModelConfig, ConfigError> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            tracing::info!(path = %path, "loading model config");
            load_from_file(path).await
        }
        Err(_) => Ok(ModelConfig::default()),
    }
}
