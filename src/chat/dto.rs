use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UserMessageRequest {
    pub content: String,
}
