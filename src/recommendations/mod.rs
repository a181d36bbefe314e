pub mod agent;
pub mod dto;
pub mod extract;
pub mod handlers;
mod prompt;
pub mod services;
pub mod tools;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
