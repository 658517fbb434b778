use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::PreferencesRequest;
use super::SessionExport;
use crate::{errors::CoreError, state::AppState};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session", delete(clear_session))
        .route("/session/preferences", put(update_preferences))
        .route("/session/export", get(export_session))
}

#[instrument(skip(state))]
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(body): Json<PreferencesRequest>,
) -> Result<StatusCode, CoreError> {
    let mut session = state.session.lock().await;
    if let Some(model) = body.chat_model.as_deref() {
        session.set_chat_model(model)?;
    }
    if let Some(learning_mode) = body.learning_mode {
        session.learning_mode = learning_mode;
    }
    info!(
        learning_mode = session.learning_mode,
        chat_model = ?session.chat_model,
        "preferences updated"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn clear_session(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.clear_all();
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn export_session(State(state): State<AppState>) -> Json<SessionExport> {
    Json(state.session.lock().await.export())
}
