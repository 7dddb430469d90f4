pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::{NewUser, User, UserRepo};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
