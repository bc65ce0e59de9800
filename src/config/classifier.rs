// src/config/classifier.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_body_excerpt_chars() -> usize {
    500
}
fn default_max_tokens() -> u32 {
    300
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from ANTHROPIC_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Listing body is cut to this many characters before it is sent.
    #[serde(default = "default_body_excerpt_chars")]
    pub body_excerpt_chars: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: default_api_key(),
            body_excerpt_chars: default_body_excerpt_chars(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClassifierConfig {
    /// Resolve an `"ENV"` api key. A missing variable leaves the key empty;
    /// building the real classifier rejects that later, so tools that never
    /// classify can still load the config.
    pub(crate) fn resolve_secrets(&mut self) -> anyhow::Result<()> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_API_KEY).unwrap_or_default();
            if self.api_key.is_empty() {
                tracing::warn!("{ENV_API_KEY} not set; classifier unavailable");
            }
        }
        if self.body_excerpt_chars == 0 {
            self.body_excerpt_chars = default_body_excerpt_chars();
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("classifier.model must not be empty");
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
