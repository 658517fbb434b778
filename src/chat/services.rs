use serde::Serialize;
use time::{macros::format_description, OffsetDateTime};
use tracing::{debug, info, warn};

use super::prompts::{CONTEXT_MEALS, LEARNING_MODE_PROMPT, SYSTEM_PROMPT};
use crate::dosing::Estimate;
use crate::errors::CoreError;
use crate::llm::{collect_reply, ChatMessage, ChatRole, TextGenerator};
use crate::meals::MealEntry;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

/// Chat history. Turns alternate user/assistant; at most one assistant
/// reply per user turn.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn has_pending_user_turn(&self) -> bool {
        matches!(self.turns.last(), Some(t) if t.role == ChatRole::User)
    }

    pub fn submit_user_turn(&mut self, text: impl Into<String>) -> Result<(), CoreError> {
        let content = text.into();
        if content.trim().is_empty() {
            return Err(CoreError::invalid("message is empty"));
        }
        if self.has_pending_user_turn() {
            warn!("user turn submitted while previous one is unanswered");
            return Err(CoreError::OutOfOrder(
                "previous message has not been answered yet".into(),
            ));
        }
        self.turns.push(ConversationTurn {
            role: ChatRole::User,
            content,
            timestamp: Some(OffsetDateTime::now_utc()),
        });
        Ok(())
    }

    /// Full message list sent to the model: preamble with settings and the
    /// last few meals, the learning-mode fragment if enabled, then history.
    pub fn build_messages(
        &self,
        settings: &Settings,
        recent_meals: &[MealEntry],
        learning_mode: bool,
    ) -> Vec<ChatMessage> {
        let mut preamble = String::from(SYSTEM_PROMPT);
        preamble.push_str(&settings_context(settings));
        preamble.push_str(&meal_context(recent_meals));

        let mut messages = Vec::with_capacity(self.turns.len() + 2);
        messages.push(ChatMessage::system(preamble));
        if learning_mode {
            messages.push(ChatMessage::system(LEARNING_MODE_PROMPT));
        }
        messages.extend(self.turns.iter().map(|t| ChatMessage {
            role: t.role,
            content: t.content.clone(),
        }));
        messages
    }

    /// Answers the pending user turn. The assistant turn is committed only
    /// after the whole reply has streamed in. `model` is the session's chat
    /// model choice, if any.
    pub async fn generate_reply(
        &mut self,
        generator: &dyn TextGenerator,
        settings: &Settings,
        recent_meals: &[MealEntry],
        learning_mode: bool,
        model: Option<&str>,
    ) -> Result<String, CoreError> {
        if !self.has_pending_user_turn() {
            return Err(CoreError::OutOfOrder(
                "no unanswered user message to reply to".into(),
            ));
        }

        let messages = self.build_messages(settings, recent_meals, learning_mode);
        debug!(messages = messages.len(), learning_mode, ?model, "requesting reply");
        let stream = generator.complete_stream(model, &messages).await?;
        let reply = collect_reply(stream).await?;

        self.turns.push(ConversationTurn {
            role: ChatRole::Assistant,
            content: reply.clone(),
            timestamp: Some(OffsetDateTime::now_utc()),
        });
        info!(chars = reply.len(), "assistant reply stored");
        Ok(reply)
    }
}

fn settings_context(settings: &Settings) -> String {
    let current = settings
        .current_bs()
        .map(|bs| format!("{bs} mg/dL"))
        .unwrap_or_else(|| "not provided".into());
    format!(
        "\n\nUSER SETTINGS: ICR 1:{}, correction factor 1:{} mg/dL, target {} mg/dL, current {current}",
        settings.icr(),
        settings.cf(),
        settings.target_bs()
    )
}

pub fn meal_context(meals: &[MealEntry]) -> String {
    if meals.is_empty() {
        return String::new();
    }
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let start = meals.len().saturating_sub(CONTEXT_MEALS);

    let mut out = String::from("\n\nRECENT MEAL LOG:\n");
    for meal in &meals[start..] {
        let when = meal.timestamp().format(&fmt).unwrap_or_default();
        let name = meal.meal().map(|m| format!(" {m}")).unwrap_or_default();
        out.push_str(&format!(
            "- {when}{name}: {}g carbs, {}u estimated\n",
            meal.carbs(),
            meal.estimate().total()
        ));
    }
    out
}

/// User turn asking the assistant to walk through the latest estimate.
pub fn explain_estimate_prompt(analysis: Option<&str>, estimate: &Estimate) -> String {
    format!(
        "The system calculated an insulin estimate for my meal:

**Meal Analysis:**
{}

**Estimate Calculation:**
- Total: {} units
- Meal bolus: {:.1} units (from {}g carbs / ICR 1:{})
- Correction: {:.1} units (correction factor 1:{})

Can you explain this estimate and what factors might affect my actual insulin needs?",
        analysis.unwrap_or("(no analysis text)"),
        estimate.total(),
        estimate.meal_bolus(),
        estimate.carbs(),
        estimate.icr(),
        estimate.correction_bolus(),
        estimate.cf(),
    )
}
