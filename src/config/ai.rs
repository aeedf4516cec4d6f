// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

fn default_text_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_vision_model() -> String {
    "gpt-4o".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/ai")
}
fn default_cache_ttl_days() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Per-request timeout; a timed out call is an absent signal.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: i64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            cache_dir: default_cache_dir(),
            cache_ttl_days: default_cache_ttl_days(),
        }
    }
}

impl AiConfig {
    /// Resolve `api_key == "ENV"` from the environment.
    /// An enabled config without a usable key is an error.
    pub fn resolve_api_key(&mut self) -> anyhow::Result<()> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            match env::var("OPENAI_API_KEY") {
                Ok(key) if !key.trim().is_empty() => self.api_key = key,
                _ if self.enabled => anyhow::bail!("Missing OPENAI_API_KEY env var"),
                _ => self.api_key.clear(),
            }
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.cache_ttl_days < 0 {
            self.cache_ttl_days = default_cache_ttl_days();
        }
        Ok(())
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_key.trim().eq_ignore_ascii_case("env")
    }
}
