use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dosing::Estimate;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSource {
    Photo,
    Manual,
}

/// One logged meal. Fields are read-only once created.
#[derive(Debug, Clone, Serialize)]
pub struct MealEntry {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    carbs: f64,
    estimate: Estimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    meal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<String>,
    source: MealSource,
    settings_used: Settings,
}

impl MealEntry {
    /// `settings` is copied in, so later settings changes never reach this entry.
    pub fn new(
        estimate: Estimate,
        settings: Settings,
        source: MealSource,
        meal: Option<String>,
        analysis: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: OffsetDateTime::now_utc(),
            carbs: estimate.carbs(),
            estimate,
            meal,
            analysis,
            source,
            settings_used: settings,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn carbs(&self) -> f64 {
        self.carbs
    }

    pub fn estimate(&self) -> &Estimate {
        &self.estimate
    }

    pub fn meal(&self) -> Option<&str> {
        self.meal.as_deref()
    }

    #[cfg(test)]
    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn source(&self) -> MealSource {
        self.source
    }

    #[cfg(test)]
    pub fn settings_used(&self) -> &Settings {
        &self.settings_used
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MealStats {
    pub count: usize,
    pub average_carbs: f64,
    pub average_estimate: f64,
    pub photo_count: usize,
}
