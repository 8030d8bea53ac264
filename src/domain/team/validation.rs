//! Team validation

use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team ID cannot be empty")]
    EmptyId,

    #[error("Team ID cannot exceed {0} characters")]
    IdTooLong(usize),

    #[error("Team ID cannot contain '/' or whitespace")]
    InvalidIdCharacters,

    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team name cannot exceed {0} characters")]
    NameTooLong(usize),
}

const MAX_TEAM_ID_LENGTH: usize = 128;
const MAX_TEAM_NAME_LENGTH: usize = 100;

/// Validate a team ID
///
/// IDs are document keys in the directory, so path separators are refused.
pub fn validate_team_id(id: &str) -> Result<(), TeamValidationError> {
    if id.is_empty() {
        return Err(TeamValidationError::EmptyId);
    }

    if id.len() > MAX_TEAM_ID_LENGTH {
        return Err(TeamValidationError::IdTooLong(MAX_TEAM_ID_LENGTH));
    }

    if id.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(TeamValidationError::InvalidIdCharacters);
    }

    Ok(())
}

/// Validate a team name
pub fn validate_team_name(name: &str) -> Result<(), TeamValidationError> {
    if name.trim().is_empty() {
        return Err(TeamValidationError::EmptyName);
    }

    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Err(TeamValidationError::NameTooLong(MAX_TEAM_NAME_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_team_id() {
        assert!(validate_team_id("team-1").is_ok());
        assert!(validate_team_id("Xy7_kq2PzLw").is_ok());
    }

    #[test]
    fn test_empty_team_id() {
        assert_eq!(validate_team_id(""), Err(TeamValidationError::EmptyId));
    }

    #[test]
    fn test_team_id_too_long() {
        let long_id = "a".repeat(129);
        assert_eq!(
            validate_team_id(&long_id),
            Err(TeamValidationError::IdTooLong(128))
        );
    }

    #[test]
    fn test_invalid_team_id_characters() {
        assert_eq!(
            validate_team_id("teams/abc"),
            Err(TeamValidationError::InvalidIdCharacters)
        );
        assert_eq!(
            validate_team_id("my team"),
            Err(TeamValidationError::InvalidIdCharacters)
        );
    }

    #[test]
    fn test_team_name() {
        assert!(validate_team_name("Rustaceans").is_ok());
        assert_eq!(validate_team_name("   "), Err(TeamValidationError::EmptyName));
        assert_eq!(
            validate_team_name(&"a".repeat(101)),
            Err(TeamValidationError::NameTooLong(100))
        );
    }
}
