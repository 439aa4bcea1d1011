use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod role;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
