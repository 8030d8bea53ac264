//! User identity

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_NPUB_LENGTH: usize = 128;

/// Errors raised while validating a user identity
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdentityValidationError {
    #[error("Identity cannot be empty")]
    Empty,

    #[error("Identity cannot exceed {0} characters")]
    TooLong(usize),

    #[error("Identity cannot contain whitespace")]
    Whitespace,
}

/// Opaque user identifier ("npub") of the acting user or a team member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Npub(String);

impl Npub {
    /// Create a new Npub after validation
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let value = value.into();
        validate_npub(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Npub {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Npub> for String {
    fn from(npub: Npub) -> Self {
        npub.0
    }
}

impl std::fmt::Display for Npub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate an identity string
pub fn validate_npub(value: &str) -> Result<(), IdentityValidationError> {
    if value.is_empty() {
        return Err(IdentityValidationError::Empty);
    }

    if value.len() > MAX_NPUB_LENGTH {
        return Err(IdentityValidationError::TooLong(MAX_NPUB_LENGTH));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(IdentityValidationError::Whitespace);
    }

    Ok(())
}
