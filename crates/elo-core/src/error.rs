//! Error types for elo.

use thiserror::Error;

/// Result type alias using elo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for elo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target path already holds a document
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External collaborator (geocoder, heading source) failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("notes/a.md".to_string());
        assert_eq!(err.to_string(), "Not found: notes/a.md");
    }

    #[test]
    fn test_error_display_already_exists() {
        let err = Error::AlreadyExists("Places/Europe/Spain/Madrid.md".to_string());
        assert_eq!(
            err.to_string(),
            "Already exists: Places/Europe/Spain/Madrid.md"
        );
    }

    #[test]
    fn test_error_display_collaborator() {
        let err = Error::Collaborator("geocoder timeout".to_string());
        assert_eq!(err.to_string(), "Collaborator error: geocoder timeout");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing vault root".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing vault root");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [unclosed").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
