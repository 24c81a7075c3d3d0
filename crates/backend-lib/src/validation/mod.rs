// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for credentials, profiles and rooms.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
pub const MAX_IDENTIFIER_LENGTH: usize = 254; // RFC 5321 SMTP limit
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MAX_ROOM_NAME_LENGTH: usize = 64;
pub const MIN_ROOM_PLAYERS: i32 = 1;
pub const MAX_ROOM_PLAYERS: i32 = 32;
pub const MAX_SOUND_VOLUME: i32 = 100;

// Regex patterns for validation
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());
static LANG_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]{2}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid language code: {0}")]
    InvalidLangCode(String),

    #[error("Invalid sound volume: {0}")]
    InvalidVolume(String),

    #[error("Invalid room: {0}")]
    InvalidRoom(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Normalise a login identifier for storage and lookup
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Validate an already normalised login identifier (email or username)
pub fn validate_identifier(identifier: &str) -> ValidationResult<&str> {
    if identifier.is_empty() {
        return Err(ValidationError::InvalidIdentifier(
            "identifier must not be empty".to_string(),
        ));
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::InvalidIdentifier(format!(
            "identifier cannot exceed {MAX_IDENTIFIER_LENGTH} characters"
        )));
    }

    if identifier.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidIdentifier(
            "identifier must not contain whitespace".to_string(),
        ));
    }

    Ok(identifier)
}

/// Validate a password; only presence and an upper bound are enforced
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "password must not be empty".to_string(),
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

/// Validate an optional display name
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "username must be between 1 and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "username may contain only letters, digits, `_`, `.` and `-`".to_string(),
        ));
    }

    Ok(username)
}

/// Two lowercase ASCII letters
pub fn validate_lang_code(code: &str) -> ValidationResult<&str> {
    if !LANG_CODE_REGEX.is_match(code) {
        return Err(ValidationError::InvalidLangCode(format!(
            "`{code}` is not a two-letter lowercase code"
        )));
    }
    Ok(code)
}

pub fn validate_sound_volume(volume: i32) -> ValidationResult<i16> {
    if !(0..=MAX_SOUND_VOLUME).contains(&volume) {
        return Err(ValidationError::InvalidVolume(format!(
            "volume must be within 0..={MAX_SOUND_VOLUME}"
        )));
    }
    // In range, cannot truncate
    Ok(volume as i16)
}

/// Validate a room name (trimmed by the caller)
pub fn validate_room_name(name: &str) -> ValidationResult<&str> {
    if name.is_empty() {
        return Err(ValidationError::InvalidRoom("name must not be empty".to_string()));
    }

    if name.chars().count() > MAX_ROOM_NAME_LENGTH {
        return Err(ValidationError::InvalidRoom(format!(
            "name cannot exceed {MAX_ROOM_NAME_LENGTH} characters"
        )));
    }

    Ok(name)
}

pub fn validate_max_players(max_players: i32) -> ValidationResult<i32> {
    if !(MIN_ROOM_PLAYERS..=MAX_ROOM_PLAYERS).contains(&max_players) {
        return Err(ValidationError::InvalidRoom(format!(
            "max_players must be within {MIN_ROOM_PLAYERS}..={MAX_ROOM_PLAYERS}"
        )));
    }
    Ok(max_players)
}
