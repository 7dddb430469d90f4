use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        jwt::JwtKeys,
        services::{
            hash_password, is_valid_email, verify_password, MIN_NAME_CHARS, MIN_PASSWORD_CHARS,
        },
    },
    db::RepoError,
    error::AppError,
    state::AppState,
    users::NewUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn check_credentials_shape(email: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        warn!("password too short");
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_string();
    payload.name = payload.name.trim().to_string();

    check_credentials_shape(&payload.email, &payload.password)?;
    if payload.name.chars().count() < MIN_NAME_CHARS {
        warn!("name too short");
        return Err(AppError::BadRequest(format!(
            "Name must be at least {MIN_NAME_CHARS} characters"
        )));
    }

    let taken = state
        .users
        .get_by_email(&payload.email)
        .await
        .map_err(|e| AppError::internal("find user by email failed", e))?;
    if taken.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Internal { retryable: false }
    })?;

    let new_user = NewUser {
        email: payload.email,
        name: payload.name,
        password_hash,
    };
    let user = match state.users.insert(new_user).await {
        Ok(u) => u,
        Err(RepoError::Conflict) => {
            warn!("email registered concurrently");
            return Err(AppError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(AppError::internal("create user failed", e)),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_string();
    check_credentials_shape(&payload.email, &payload.password)?;

    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let user = match state.users.get_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(invalid());
        }
        Err(e) => return Err(AppError::internal("find user by email failed", e)),
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal { retryable: false }
    })?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}
