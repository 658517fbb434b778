use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument};

use super::dto::UpdateSettingRequest;
use super::services::{SettingField, Settings};
use crate::{errors::CoreError, state::AppState};

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).patch(update_setting))
}

#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let session = state.session.lock().await;
    Json(session.settings.snapshot())
}

#[instrument(skip(state))]
pub async fn update_setting(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingRequest>,
) -> Result<Json<Settings>, CoreError> {
    let field: SettingField = body.field.parse()?;
    let mut session = state.session.lock().await;
    session.settings.update(field, body.value)?;
    info!(%field, value = ?body.value, "settings changed");
    Ok(Json(session.settings.snapshot()))
}
