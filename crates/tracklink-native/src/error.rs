//! Errors at the boundary with the tracking service.

use std::time::Duration;

use thiserror::Error;

/// Errors from the tracking service or the channels that reach it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested item is not (or no longer) held by the service
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request did not complete before its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// No service connection is available
    #[error("Service disconnected")]
    Disconnected,

    /// The request or response channel closed mid-request
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// A fixture or settings document could not be parsed
    #[error("Invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    /// Reading a fixture or settings file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ServiceError::NotFound("frame 9".to_string()).to_string(), "Not found: frame 9");
        assert_eq!(
            ServiceError::Timeout(Duration::from_millis(250)).to_string(),
            "Request timed out after 250ms"
        );
        assert_eq!(ServiceError::Disconnected.to_string(), "Service disconnected");
    }

    #[test]
    fn test_json_error_converts() {
        let err: ServiceError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, ServiceError::Fixture(_)));
    }
}
