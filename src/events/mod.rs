mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::{Event, EventFields, EventRepo};

pub fn router() -> Router<AppState> {
    handlers::event_routes()
}
