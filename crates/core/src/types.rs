use crate::error::CoreError;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse an id received as free text (query strings, form fields).
///
/// Rejects anything that is not a positive integer; `field` names the input
/// in the error message.
pub fn parse_id(raw: &str, field: &str) -> Result<DbId, CoreError> {
    match raw.trim().parse::<DbId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CoreError::validation(format!("Invalid {field}: '{raw}'"))),
    }
}
