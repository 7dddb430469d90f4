use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::repo::User;
use crate::{error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .users
        .get_all()
        .await
        .map_err(|e| AppError::internal("list users failed", e))?;
    Ok(Json(users))
}
