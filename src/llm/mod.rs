pub mod openai;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::images::UploadItem;
use crate::settings::Settings;

pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Reply text in the order the model produced it.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, CoreError>> + Send>>;

#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Free-form analysis text expected to contain a `CARBS: <n>g` line.
    async fn analyze(&self, image: &UploadItem, settings: &Settings) -> Result<String, CoreError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// `model` overrides the configured chat model for this call.
    async fn complete_stream(
        &self,
        model: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<ReplyStream, CoreError>;
}

/// Concatenates fragments; the first error discards everything read so far.
pub async fn collect_reply(mut stream: ReplyStream) -> Result<String, CoreError> {
    let mut full = String::new();
    while let Some(fragment) = stream.next().await {
        full.push_str(&fragment?);
    }
    Ok(full)
}
