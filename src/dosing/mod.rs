mod dto;
pub mod handlers;
pub mod services;

pub use services::Estimate;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::estimate_routes()
}
