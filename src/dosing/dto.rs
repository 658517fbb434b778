use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub carbs: f64,
    /// Overrides the session reading for this calculation only.
    #[serde(default)]
    pub current_glucose: Option<i32>,
}
