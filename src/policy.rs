//! Ownership rule for every event mutation: update, delete, adding and
//! removing attendees. There are no roles and no delegation.

use tracing::warn;

use crate::{error::AppError, events::Event};

pub fn can_mutate_event(actor_user_id: i64, event: &Event) -> bool {
    event.owner_id == actor_user_id
}

/// Call only after the event is known to exist, so a missing event is a 404
/// rather than a 403.
pub fn ensure_can_mutate_event(
    actor_user_id: i64,
    event: &Event,
    action: &str,
) -> Result<(), AppError> {
    if can_mutate_event(actor_user_id, event) {
        return Ok(());
    }
    warn!(
        actor = actor_user_id,
        owner = event.owner_id,
        event_id = event.id,
        action,
        "event mutation forbidden"
    );
    Err(AppError::Forbidden(format!(
        "You do not have permission to {action} this event"
    )))
}
