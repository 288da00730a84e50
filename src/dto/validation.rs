//! Validation helpers for DTOs.

use validator::ValidationError;

/// Shortest accepted display name, in characters.
pub const NAME_MIN_CHARS: usize = 3;
/// Longest accepted display name, in characters.
pub const NAME_MAX_CHARS: usize = 10;
/// Longest accepted chat message, in characters.
pub const MESSAGE_MAX_CHARS: usize = 500;

/// Validates a display name: 3 to 10 characters once trimmed, no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Hana")        // Ok
/// validate_display_name("  Al ")       // Err - too short once trimmed
/// validate_display_name("Bartholomew") // Err - too long
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    let chars = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be {NAME_MIN_CHARS} to {NAME_MAX_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a chat message: not blank, at most 500 characters.
pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        let mut err = ValidationError::new("message_empty");
        err.message = Some("Message must not be empty".into());
        return Err(err);
    }

    let chars = message.chars().count();
    if chars > MESSAGE_MAX_CHARS {
        let mut err = ValidationError::new("message_length");
        err.message =
            Some(format!("Message must be at most {MESSAGE_MAX_CHARS} characters (got {chars})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Ann").is_ok());
        assert!(validate_display_name("Maximilian").is_ok());
        assert!(validate_display_name("  Hana  ").is_ok());
        assert!(validate_display_name("Zoë").is_ok());
    }

    #[test]
    fn test_validate_display_name_invalid_length() {
        assert!(validate_display_name("Al").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("Bartholomew").is_err());
    }

    #[test]
    fn test_validate_display_name_invalid_format() {
        assert!(validate_display_name("Ann\n").is_ok()); // trimmed
        assert!(validate_display_name("An\tn").is_err());
    }

    #[test]
    fn test_validate_message() {
        assert!(validate_message("hello").is_ok());
        assert!(validate_message(" \n ").is_err());
        assert!(validate_message(&"x".repeat(MESSAGE_MAX_CHARS)).is_ok());
        assert!(validate_message(&"x".repeat(MESSAGE_MAX_CHARS + 1)).is_err());
    }
}
