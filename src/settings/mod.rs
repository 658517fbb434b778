mod dto;
pub mod handlers;
pub mod services;

pub use services::{SessionSettings, SettingField, Settings};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::settings_routes()
}
