//! Environment configuration

use crate::chat::SessionOptions;
use crate::llm::{ModelUri, ModelUriError};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_URI: &str = "hf:mradermacher/NileChat-3B-ft-base-GGUF:Q4_K_M";
pub const DEFAULT_LLM_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Server and inference provider configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub port: u16,
    /// Base URL of the local inference server
    pub llm_url: String,
    pub model_uri: String,
    pub models_dir: PathBuf,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub llm_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            llm_url: DEFAULT_LLM_URL.to_string(),
            model_uri: DEFAULT_MODEL_URI.to_string(),
            models_dir: PathBuf::from("models"),
            system_prompt: None,
            max_tokens: None,
            llm_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparseable numbers fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            port: non_empty("NILE_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            llm_url: non_empty("NILE_LLM_URL").unwrap_or(defaults.llm_url),
            model_uri: non_empty("NILE_MODEL_URI").unwrap_or(defaults.model_uri),
            models_dir: non_empty("NILE_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            system_prompt: non_empty("NILE_SYSTEM_PROMPT"),
            max_tokens: non_empty("NILE_MAX_TOKENS").and_then(|v| v.trim().parse().ok()),
            llm_timeout: non_empty("NILE_LLM_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map_or(defaults.llm_timeout, Duration::from_secs),
        }
    }

    pub fn model_uri(&self) -> Result<ModelUri, ModelUriError> {
        ModelUri::parse(&self.model_uri)
    }

    /// Model id to send to the inference server: the local file stem when
    /// the model is on disk, otherwise the URI itself
    pub fn resolve_model_id(&self) -> Result<String, ModelUriError> {
        let uri = self.model_uri()?;
        match uri.resolve_local(&self.models_dir) {
            Some(path) => {
                tracing::info!(path = %path.display(), "Resolved local model file");
                Ok(path
                    .file_stem()
                    .map_or_else(|| uri.to_string(), |s| s.to_string_lossy().into_owned()))
            }
            None => {
                tracing::warn!(
                    uri = %uri,
                    models_dir = %self.models_dir.display(),
                    "Model file not found locally; the inference server must provide it"
                );
                Ok(uri.to_string())
            }
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            system_prompt: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
        }
    }
}
