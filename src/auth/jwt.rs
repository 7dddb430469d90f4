use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, error::AppError, state::AppState};

/// JWT payload: who the bearer is and until when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token")]
    Signing,
}

/// Signing and verification keys plus the token policy.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::hours(cfg.ttl_hours),
        }
    }

    pub fn sign(&self, user_id: i64) -> Result<String, AuthError> {
        self.sign_at(user_id, OffsetDateTime::now_utc())
    }

    fn sign_at(&self, user_id: i64, now: OffsetDateTime) -> Result<String, AuthError> {
        let exp = now + self.ttl;
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp().max(0) as u64,
            exp: exp.unix_timestamp().max(0) as u64,
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::Signing)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidSignature,
            }
        })?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims.user_id)
    }
}

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        match keys.verify(token) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(AuthError::Expired) => {
                warn!("expired token");
                Err(AppError::Unauthorized("Token expired".into()))
            }
            Err(_) => {
                warn!("invalid token");
                Err(AppError::Unauthorized("Invalid token".into()))
            }
        }
    }
}

/// Confirms the token's user still exists and returns its id.
pub async fn resolve_actor(state: &AppState, auth: AuthUser) -> Result<i64, AppError> {
    let AuthUser(user_id) = auth;
    match state.users.get(user_id).await {
        Ok(Some(user)) => Ok(user.id),
        Ok(None) => {
            warn!(user_id, "token for unknown user");
            Err(AppError::Unauthorized("Invalid token".into()))
        }
        Err(e) => Err(AppError::internal("resolve actor failed", e)),
    }
}
