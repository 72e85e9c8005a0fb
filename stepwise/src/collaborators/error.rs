//! Collaborator error type.

use thiserror::Error;

/// Errors returned by the backend collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The addressed item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Local IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollaboratorError {
    /// Returns true if retrying the same call could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_transience() {
        let err = CollaboratorError::NotFound("client#c-1/profile".to_string());
        assert_eq!(err.to_string(), "not found: client#c-1/profile");
        assert!(!err.is_transient());
        assert!(CollaboratorError::Unavailable("timeout".to_string()).is_transient());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err: CollaboratorError = io.into();
        assert!(matches!(err, CollaboratorError::Io(_)));
    }
}
