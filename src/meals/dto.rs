use serde::{Deserialize, Serialize};

use super::repo_types::MealEntry;
use crate::analysis::MealAnalysis;

#[derive(Debug, Deserialize)]
pub struct ManualMealRequest {
    #[serde(default)]
    pub meal: Option<String>,
    pub carbs: f64,
    #[serde(default)]
    pub current_glucose: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PhotoMealResponse {
    pub entry: MealEntry,
    pub analysis: MealAnalysis,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize { 10 }
