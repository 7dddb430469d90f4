use crate::error::AppError;

/// Parses a path segment as a positive integer id.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("Invalid {what} id"))),
    }
}
