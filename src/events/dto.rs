use serde::Deserialize;

use super::repo::{iso_date, EventFields};
use crate::error::AppError;

const MIN_NAME_CHARS: usize = 3;
const MIN_DESCRIPTION_CHARS: usize = 10;
const MIN_LOCATION_CHARS: usize = 3;

/// Body of `POST /events` and `PUT /events/:id`. Any id or owner sent by the
/// client is ignored.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
}

impl EventRequest {
    pub fn into_fields(self) -> Result<EventFields, AppError> {
        let name = self.name.trim().to_string();
        let description = self.description.trim().to_string();
        let location = self.location.trim().to_string();

        at_least("name", &name, MIN_NAME_CHARS)?;
        at_least("description", &description, MIN_DESCRIPTION_CHARS)?;
        at_least("location", &location, MIN_LOCATION_CHARS)?;
        let date = iso_date::parse(self.date.trim())
            .map_err(|_| AppError::BadRequest("date must be formatted as YYYY-MM-DD".into()))?;

        Ok(EventFields {
            name,
            description,
            date,
            location,
        })
    }
}

fn at_least(field: &str, value: &str, min: usize) -> Result<(), AppError> {
    if value.chars().count() < min {
        return Err(AppError::BadRequest(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}
