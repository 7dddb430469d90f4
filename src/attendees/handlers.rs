use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::repo::Attendance;
use crate::{
    auth::{resolve_actor, AuthUser},
    db::RepoError,
    error::AppError,
    events::{handlers::load_event, Event},
    params::parse_id,
    policy::ensure_can_mutate_event,
    state::AppState,
    users::User,
};

pub fn attendee_routes() -> Router<AppState> {
    Router::new()
        .route("/events/:id/attendees", get(get_attendees_for_event))
        .route(
            "/events/:id/attendees/:user_id",
            post(add_attendee_to_event).delete(remove_attendee_from_event),
        )
        .route("/attendees/:id/events", get(get_events_by_attendee))
}

#[instrument(skip(state))]
pub async fn get_attendees_for_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    let event_id = parse_id(&id, "event")?;
    let users = state
        .attendees
        .get_by_event(event_id)
        .await
        .map_err(|e| AppError::internal("list attendees failed", e))?;
    Ok(Json(users))
}

#[instrument(skip(state, auth))]
pub async fn add_attendee_to_event(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
    auth: Result<AuthUser, AppError>,
) -> Result<(StatusCode, Json<Attendance>), AppError> {
    let event_id = parse_id(&id, "event")?;
    let user_id = parse_id(&user_id, "user")?;

    let event = load_event(&state, event_id).await?;
    let actor = resolve_actor(&state, auth?).await?;
    ensure_can_mutate_event(actor, &event, "add attendees to")?;

    let user = state
        .users
        .get(user_id)
        .await
        .map_err(|e| AppError::internal("load user failed", e))?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let already = || AppError::Conflict("User is already an attendee of this event".into());

    let existing = state
        .attendees
        .get_by_event_and_user(event.id, user.id)
        .await
        .map_err(|e| AppError::internal("load attendance failed", e))?;
    if existing.is_some() {
        return Err(already());
    }

    let attendance = match state.attendees.insert(event.id, user.id).await {
        Ok(a) => a,
        Err(RepoError::Conflict) => {
            warn!(event_id = event.id, user_id = user.id, "attendee added concurrently");
            return Err(already());
        }
        Err(RepoError::MissingReference) => {
            warn!(event_id = event.id, user_id = user.id, "event or user removed during add");
            return Err(AppError::NotFound("Event not found".into()));
        }
        Err(e) => return Err(AppError::internal("add attendee failed", e)),
    };

    info!(event_id = event.id, user_id = user.id, "attendee added");
    Ok((StatusCode::CREATED, Json(attendance)))
}

#[instrument(skip(state, auth))]
pub async fn remove_attendee_from_event(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
    auth: Result<AuthUser, AppError>,
) -> Result<StatusCode, AppError> {
    let event_id = parse_id(&id, "event")?;
    let user_id = parse_id(&user_id, "user")?;

    let event = load_event(&state, event_id).await?;
    let actor = resolve_actor(&state, auth?).await?;
    ensure_can_mutate_event(actor, &event, "remove attendees from")?;

    state
        .attendees
        .delete(user_id, event.id)
        .await
        .map_err(|e| AppError::internal("remove attendee failed", e))?;

    info!(event_id = event.id, user_id, "attendee removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_events_by_attendee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Event>>, AppError> {
    let user_id = parse_id(&id, "attendee")?;
    let events = state
        .attendees
        .get_events_by_user(user_id)
        .await
        .map_err(|e| AppError::internal("list events by attendee failed", e))?;
    Ok(Json(events))
}
