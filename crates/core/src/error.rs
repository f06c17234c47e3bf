//! Errors raised while building or checking store entities.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Input that no store entity can accept. Lookups and persistence failures
/// live with the repositories.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Field outside its allowed set, e.g. an unknown status or a short password.
    /// Displays as the bare message so it can be shown to clients unchanged.
    #[error("{0}")]
    Validation(String),

    #[error("invalid id: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Serial ids start at 1.
pub fn ensure_positive_id(id: i32) -> DomainResult<i32> {
    if id < 1 {
        return Err(DomainError::invalid_id(format!("id must be positive, got {id}")));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_ids_pass_through() {
        assert_eq!(ensure_positive_id(7), Ok(7));
    }

    #[test]
    fn zero_and_negative_ids_are_rejected() {
        assert!(matches!(ensure_positive_id(0), Err(DomainError::InvalidId(_))));
        assert!(matches!(ensure_positive_id(-3), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn validation_displays_its_message_verbatim() {
        let err = DomainError::validation("invalid quantity");
        assert_eq!(err.to_string(), "invalid quantity");
    }
}
