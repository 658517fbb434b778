mod dto;
pub mod handlers;
pub mod prompts;
pub mod services;

pub use services::Conversation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::chat_routes()
}
