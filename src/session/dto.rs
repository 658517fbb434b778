use serde::Deserialize;

/// Omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub learning_mode: Option<bool>,
    pub chat_model: Option<String>,
}
