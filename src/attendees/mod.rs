pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::{Attendance, AttendeeRepo};

pub fn router() -> Router<AppState> {
    handlers::attendee_routes()
}
