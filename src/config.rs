use anyhow::Context;
use serde::Deserialize;

use crate::settings::Settings;

/// Chat models a session may pick from.
pub const CHAT_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"];

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub vision_model: String,
    pub chat_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            vision_model: "gpt-4o".into(),
            chat_model: "gpt-4o".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub default_settings: Settings,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = LlmConfig::default();
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or(defaults.chat_model);
        anyhow::ensure!(
            CHAT_MODELS.contains(&chat_model.as_str()),
            "CHAT_MODEL must be one of {CHAT_MODELS:?}, got {chat_model:?}"
        );

        let llm = LlmConfig {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            vision_model: std::env::var("VISION_MODEL").unwrap_or(defaults.vision_model),
            chat_model,
        };

        let base = Settings::default();
        let default_settings = Settings::new(
            env_i32("DEFAULT_ICR")?.unwrap_or(base.icr()),
            env_i32("DEFAULT_CF")?.unwrap_or(base.cf()),
            env_i32("DEFAULT_TARGET_BS")?.unwrap_or(base.target_bs()),
            None,
        )
        .context("default settings")?;

        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(20 * 1024 * 1024);

        Ok(Self {
            llm,
            default_settings,
            max_upload_bytes,
        })
    }
}

fn env_i32(key: &str) -> anyhow::Result<Option<i32>> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<i32>()
            .map(Some)
            .with_context(|| format!("{key} must be an integer")),
        Err(_) => Ok(None),
    }
}
