mod dto;
pub mod handlers;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::chat::Conversation;
use crate::config::CHAT_MODELS;
use crate::dosing::Estimate;
use crate::errors::CoreError;
use crate::meals::{MealEntry, MealLog};
use crate::settings::{SessionSettings, Settings};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::session_routes()
}

/// Everything one user session owns. Passed explicitly to each operation.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub settings: SessionSettings,
    pub meals: MealLog,
    pub conversation: Conversation,
    pub learning_mode: bool,
    /// Overrides the configured chat model when set.
    pub chat_model: Option<String>,
    pub last_analysis: Option<String>,
    pub last_estimate: Option<Estimate>,
}

#[derive(Debug, Serialize)]
pub struct SessionExport {
    pub meal_log: Vec<MealEntry>,
    pub settings: Settings,
    #[serde(with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
}

impl SessionContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: SessionSettings::new(settings),
            ..Self::default()
        }
    }

    pub fn set_chat_model(&mut self, model: &str) -> Result<(), CoreError> {
        if !CHAT_MODELS.contains(&model) {
            return Err(CoreError::invalid(format!(
                "chat_model must be one of {CHAT_MODELS:?}, got {model:?}"
            )));
        }
        self.chat_model = Some(model.to_string());
        Ok(())
    }

    /// Drops meals, chat and the last result. Settings are kept.
    pub fn clear_all(&mut self) {
        self.meals.clear();
        self.conversation.clear();
        self.last_analysis = None;
        self.last_estimate = None;
        info!("session data cleared");
    }

    pub fn export(&self) -> SessionExport {
        SessionExport {
            meal_log: self.meals.entries().to_vec(),
            settings: self.settings.snapshot(),
            exported_at: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;
    use crate::meals::services::log_manual_meal;
    use crate::settings::SettingField;

    #[test]
    fn clear_all_keeps_settings() {
        let mut ctx = SessionContext::new(Settings::new(12, 40, 110, None).unwrap());
        log_manual_meal(&mut ctx, Some("tea".into()), 10.0, None).unwrap();
        ctx.conversation.submit_user_turn("hi").unwrap();
        ctx.clear_all();
        assert!(ctx.meals.is_empty());
        assert!(ctx.conversation.turns().is_empty());
        assert!(ctx.last_estimate.is_none());
        assert_eq!(ctx.settings.snapshot().icr(), 12);
    }

    #[test]
    fn chat_model_limited_to_offered_models() {
        let mut ctx = SessionContext::default();
        ctx.set_chat_model("gpt-4o-mini").unwrap();
        assert!(matches!(
            ctx.set_chat_model("gpt-3.5-turbo"),
            Err(CoreError::InvalidParameter(_))
        ));
        assert_eq!(ctx.chat_model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn export_serializes_log_and_settings() {
        let mut ctx = SessionContext::default();
        log_manual_meal(&mut ctx, Some("Breakfast".into()), 45.0, None).unwrap();
        ctx.settings.update(SettingField::Icr, Some(15)).unwrap();

        let json = serde_json::to_value(ctx.export()).unwrap();
        assert_eq!(json["settings"]["icr"], 15);
        assert_eq!(json["meal_log"][0]["meal"], "Breakfast");
        assert_eq!(json["meal_log"][0]["source"], "manual");
        assert_eq!(json["meal_log"][0]["settings_used"]["icr"], 10);
        assert!(json["exported_at"].is_string());
    }
}
