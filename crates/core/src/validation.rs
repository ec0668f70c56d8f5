//! Input normalization and validation for user-supplied fields.
//!
//! Each `normalize_*` function trims, canonicalizes and validates one field,
//! returning the value to persist or a [`CoreError::Validation`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

use crate::error::CoreError;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const FULL_NAME_MAX_LEN: usize = 100;
pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 5000;
pub const COMMENT_MAX_LEN: usize = 2000;
pub const POST_MAX_LEN: usize = 1000;
pub const PLAYLIST_NAME_MAX_LEN: usize = 150;

/// Minimum password length accepted at registration and password change.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Poll posts carry between 2 and 10 options.
pub const POLL_MIN_OPTIONS: usize = 2;
pub const POLL_MAX_OPTIONS: usize = 10;
pub const POLL_OPTION_MAX_LEN: usize = 100;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_.]+$").expect("username pattern is a valid regex")
});

/// Trim `value` and require it to be non-empty and at most `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(CoreError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`require_text`] but an absent or blank value is allowed.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, CoreError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => require_text(field, v, max).map(Some),
    }
}

/// Usernames are stored lower-cased and limited to `[a-z0-9_.]`.
pub fn normalize_username(raw: &str) -> Result<String, CoreError> {
    let username = raw.trim().to_lowercase();
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN || len > USERNAME_MAX_LEN {
        return Err(CoreError::validation(format!(
            "username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }
    if !USERNAME_RE.is_match(&username) {
        return Err(CoreError::validation(
            "username may only contain letters, digits, '_' and '.'",
        ));
    }
    Ok(username)
}

/// Emails are stored lower-cased.
pub fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if !email.validate_email() {
        return Err(CoreError::validation("email is not a valid address"));
    }
    Ok(email)
}

/// Validate the options of a poll post.
///
/// Labels are trimmed, must be non-empty and unique (case-insensitive).
pub fn normalize_poll_options(options: &[String]) -> Result<Vec<String>, CoreError> {
    if options.len() < POLL_MIN_OPTIONS || options.len() > POLL_MAX_OPTIONS {
        return Err(CoreError::validation(format!(
            "a poll needs between {POLL_MIN_OPTIONS} and {POLL_MAX_OPTIONS} options"
        )));
    }

    let mut seen = HashSet::with_capacity(options.len());
    let mut labels = Vec::with_capacity(options.len());
    for option in options {
        let label = require_text("poll option", option, POLL_OPTION_MAX_LEN)?;
        if !seen.insert(label.to_lowercase()) {
            return Err(CoreError::validation(format!(
                "duplicate poll option '{label}'"
            )));
        }
        labels.push(label);
    }
    Ok(labels)
}
