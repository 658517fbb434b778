use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::UserMessageRequest;
use super::prompts::CONTEXT_MEALS;
use super::services::{explain_estimate_prompt, ConversationTurn};
use crate::{errors::CoreError, state::AppState};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", get(list_turns).delete(clear_chat))
        .route("/chat/messages", post(submit_message))
        .route("/chat/explain", post(explain_last_estimate))
        .route("/chat/reply", post(generate_reply))
}

#[instrument(skip(state))]
pub async fn list_turns(State(state): State<AppState>) -> Json<Vec<ConversationTurn>> {
    let session = state.session.lock().await;
    Json(session.conversation.turns().to_vec())
}

#[instrument(skip(state, body))]
pub async fn submit_message(
    State(state): State<AppState>,
    Json(body): Json<UserMessageRequest>,
) -> Result<StatusCode, CoreError> {
    let mut session = state.session.lock().await;
    session.conversation.submit_user_turn(body.content)?;
    Ok(StatusCode::ACCEPTED)
}

/// Queues a user turn asking about the most recent estimate.
#[instrument(skip(state))]
pub async fn explain_last_estimate(State(state): State<AppState>) -> Result<StatusCode, CoreError> {
    let mut session = state.session.lock().await;
    let estimate = session
        .last_estimate
        .ok_or_else(|| CoreError::invalid("no estimate has been calculated yet"))?;
    let prompt = explain_estimate_prompt(session.last_analysis.as_deref(), &estimate);
    session.conversation.submit_user_turn(prompt)?;
    Ok(StatusCode::ACCEPTED)
}

#[instrument(skip(state))]
pub async fn generate_reply(
    State(state): State<AppState>,
) -> Result<Json<ConversationTurn>, CoreError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let settings = session.settings.snapshot();
    let learning_mode = session.learning_mode;
    session
        .conversation
        .generate_reply(
            state.chat.as_ref(),
            &settings,
            session.meals.recent(CONTEXT_MEALS),
            learning_mode,
            session.chat_model.as_deref(),
        )
        .await?;
    let turn = session
        .conversation
        .turns()
        .last()
        .cloned()
        .ok_or_else(|| CoreError::collaborator("reply was not recorded"))?;
    info!(learning_mode, "chat reply generated");
    Ok(Json(turn))
}

#[instrument(skip(state))]
pub async fn clear_chat(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.conversation.clear();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod chat_handler_tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::llm::fakes::{ScriptedChat, ScriptedVision};
    use crate::llm::ChatRole;

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn message_reply_then_second_reply_conflicts() {
        let chat = Arc::new(ScriptedChat::replying(&["Based on ", "45g carbs..."]));
        let state = AppState::fake_with(
            Arc::new(ScriptedVision::replying("CARBS: 45g")),
            chat.clone(),
        );
        let app = crate::app::build_app(state.clone());

        let res = app
            .clone()
            .oneshot(post_json("/api/v1/chat/messages", r#"{"content":"What now?"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);

        let res = app
            .clone()
            .oneshot(Request::post("/api/v1/chat/reply").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let turn: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(turn["role"], "assistant");
        assert_eq!(turn["content"], "Based on 45g carbs...");

        let res = app
            .oneshot(Request::post("/api/v1/chat/reply").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(chat.calls.lock().unwrap().len(), 1);
        assert_eq!(*chat.models.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn selected_chat_model_is_used_for_reply() {
        let chat = Arc::new(ScriptedChat::replying(&["ok"]));
        let state = AppState::fake_with(Arc::new(ScriptedVision::replying("CARBS: 45g")), chat.clone());
        let app = crate::app::build_app(state);

        let res = app
            .clone()
            .oneshot(
                Request::put("/api/v1/session/preferences")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"chat_model":"gpt-4-turbo"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        app.clone()
            .oneshot(post_json("/api/v1/chat/messages", r#"{"content":"hi"}"#))
            .await
            .unwrap();
        let res = app
            .oneshot(Request::post("/api/v1/chat/reply").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            *chat.models.lock().unwrap(),
            vec![Some("gpt-4-turbo".to_string())]
        );
    }

    #[tokio::test]
    async fn explain_requires_an_estimate() {
        let state = AppState::fake();
        let app = crate::app::build_app(state.clone());
        let res = app
            .clone()
            .oneshot(Request::post("/api/v1/chat/explain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        app.clone()
            .oneshot(post_json("/api/v1/meals/manual", r#"{"meal":"Lunch","carbs":60}"#))
            .await
            .unwrap();
        let res = app
            .oneshot(Request::post("/api/v1/chat/explain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);

        let session = state.session.lock().await;
        let turns = session.conversation.turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, ChatRole::User);
        assert!(turns[0].content.contains("Manual entry: Lunch"));
    }
}
