mod dto;
pub mod handlers;
pub mod record;
pub mod services;
pub mod source;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
