use std::io;
use thiserror::Error;

// Import module-level errors for GuardError
use crate::config::settings::ConfigError;
use crate::request::RequestError;

/// Top-level application error that wraps all module-specific errors
///
/// This provides a unified error type for application-level code while
/// preserving the specific error context from each module. All module
/// errors automatically convert to GuardError via the `From` trait.
///
/// Note that policy violations are not errors: validators report them
/// through `Verdict` values. This type only covers genuine faults
/// (unreadable input, broken configuration, I/O).
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for application-level operations
pub type GuardResult<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_converts() {
        let source = crate::request::OperationRequest::from_json("not json").unwrap_err();
        let err: GuardError = source.into();
        assert!(matches!(err, GuardError::Request(_)));
        assert!(err.to_string().starts_with("Request error:"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: GuardError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_config_error_converts() {
        let source = ConfigError::InvalidValue("bad".to_string());
        let err: GuardError = source.into();
        assert!(matches!(err, GuardError::Config(_)));
    }
}
