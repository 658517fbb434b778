use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use super::sse::{SseEvent, SseLineBuffer};
use super::{ChatMessage, ReplyStream, TextGenerator, VisionAnalyzer};
use crate::analysis::vision_prompt;
use crate::config::LlmConfig;
use crate::errors::CoreError;
use crate::images::UploadItem;
use crate::settings::Settings;

const VISION_MAX_TOKENS: u32 = 1000;
const CHAT_MAX_TOKENS: u32 = 1500;
const CHAT_TEMPERATURE: f32 = 0.7;

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, CoreError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CoreError::collaborator("OPENAI_API_KEY is not configured"))?;

        let response = self
            .client
            .post(self.url())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "llm request failed");
                CoreError::collaborator(format!("LLM request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(%status, body = %text, "llm returned error");
            return Err(CoreError::collaborator(format!(
                "LLM returned {status}: {text}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiClient {
    #[instrument(skip(self, image, settings), fields(bytes = image.body.len()))]
    async fn analyze(&self, image: &UploadItem, settings: &Settings) -> Result<String, CoreError> {
        let body = json!({
            "model": self.config.vision_model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": vision_prompt(settings) },
                    { "type": "image_url", "image_url": { "url": image.to_data_url() } }
                ]
            }],
            "max_tokens": VISION_MAX_TOKENS,
        });

        let parsed: CompletionResponse = self.post(&body).await?.json().await.map_err(|e| {
            error!(error = %e, "failed to decode vision response");
            CoreError::collaborator(format!("Failed to parse LLM response: {e}"))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CoreError::collaborator("No analysis in LLM response"))?;
        debug!(chars = text.len(), "vision analysis received");
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn complete_stream(
        &self,
        model: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<ReplyStream, CoreError> {
        let request = chat_request(model.unwrap_or(&self.config.chat_model), messages);
        let body = serde_json::to_value(&request)
            .map_err(|e| CoreError::collaborator(format!("encode request: {e}")))?;
        let response = self.post(&body).await?;
        Ok(delta_stream(response.bytes_stream().boxed()))
    }
}

fn chat_request<'a>(model: &'a str, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages,
        stream: true,
        temperature: CHAT_TEMPERATURE,
        max_tokens: CHAT_MAX_TOKENS,
    }
}

struct DeltaState {
    bytes: BoxStream<'static, reqwest::Result<Bytes>>,
    lines: SseLineBuffer,
    pending: VecDeque<Result<String, CoreError>>,
    finished: bool,
}

impl DeltaState {
    fn push(&mut self, event: SseEvent) {
        match event {
            SseEvent::Done => self.finished = true,
            SseEvent::Data(_) if self.finished => {}
            SseEvent::Data(json) => match serde_json::from_str::<StreamChunk>(&json) {
                Ok(chunk) => {
                    let delta = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .unwrap_or_default();
                    if !delta.is_empty() {
                        self.pending.push_back(Ok(delta));
                    }
                }
                Err(e) => warn!(error = %e, "skipping unreadable stream chunk"),
            },
        }
    }
}

/// Turns an SSE completion body into a stream of text deltas.
fn delta_stream(bytes: BoxStream<'static, reqwest::Result<Bytes>>) -> ReplyStream {
    let state = DeltaState {
        bytes,
        lines: SseLineBuffer::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in st.lines.feed(&chunk) {
                        st.push(event);
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending
                        .push_back(Err(CoreError::collaborator(format!("stream read error: {e}"))));
                }
                None => {
                    st.finished = true;
                    if let Some(event) = st.lines.flush() {
                        st.push(event);
                    }
                }
            }
        }
    });
    Box::pin(stream)
}
