use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{dto::EventRequest, repo::Event};
use crate::{
    auth::{resolve_actor, AuthUser},
    db::RepoError,
    error::AppError,
    params::parse_id,
    policy::ensure_can_mutate_event,
    state::AppState,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// Loads an event or fails with 404.
pub(crate) async fn load_event(state: &AppState, id: i64) -> Result<Event, AppError> {
    state
        .events
        .get(id)
        .await
        .map_err(|e| AppError::internal("load event failed", e))?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

#[instrument(skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    let events = state
        .events
        .get_all()
        .await
        .map_err(|e| AppError::internal("list events failed", e))?;
    Ok(Json(events))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let id = parse_id(&id, "event")?;
    Ok(Json(load_event(&state, id).await?))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<Event>), AppError> {
    let user_id = resolve_actor(&state, auth).await?;
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;

    let event = match state.events.insert(user_id, fields).await {
        Ok(event) => event,
        Err(RepoError::MissingReference) => {
            warn!(owner_id = user_id, "owner vanished before insert");
            return Err(AppError::Unauthorized("Invalid token".into()));
        }
        Err(e) => return Err(AppError::internal("create event failed", e)),
    };

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/events/{}", event.id)) {
        headers.insert(header::LOCATION, location);
    }

    info!(event_id = event.id, owner_id = user_id, "event created");
    Ok((StatusCode::CREATED, headers, Json(event)))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: Result<AuthUser, AppError>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<Event>, AppError> {
    let id = parse_id(&id, "event")?;
    let existing = load_event(&state, id).await?;
    let user_id = resolve_actor(&state, auth?).await?;
    ensure_can_mutate_event(user_id, &existing, "update")?;

    let Json(payload) = payload?;
    let fields = payload.into_fields()?;

    let updated = state
        .events
        .update(id, fields)
        .await
        .map_err(|e| AppError::internal("update event failed", e))?
        .ok_or_else(|| {
            warn!(event_id = id, "event deleted during update");
            AppError::NotFound("Event not found".into())
        })?;

    info!(event_id = id, "event updated");
    Ok(Json(updated))
}

#[instrument(skip(state, auth))]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: Result<AuthUser, AppError>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "event")?;
    let existing = load_event(&state, id).await?;
    let user_id = resolve_actor(&state, auth?).await?;
    ensure_can_mutate_event(user_id, &existing, "delete")?;

    let removed = state
        .events
        .delete(id)
        .await
        .map_err(|e| AppError::internal("delete event failed", e))?;
    if !removed {
        return Err(AppError::NotFound("Event not found".into()));
    }

    info!(event_id = id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
