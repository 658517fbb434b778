use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub field: String,
    // null clears the field; only current_bs accepts that
    #[serde(default)]
    pub value: Option<i32>,
}
