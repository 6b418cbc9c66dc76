use serde::{Deserialize, Serialize};

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (1xxx)
    ValidationError = 1001,

    // Transport (2xxx)
    NetworkError = 2001,
    HttpStatusError = 2002,
    FormatError = 2003,
    RelayError = 2004,
    ExhaustedFallback = 2005,
    BackendRejected = 2006,

    // Persistence (3xxx)
    StorageError = 3001,
    SerializationError = 3002,

    // State machine (4xxx)
    InvalidState = 4001,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::ValidationError => ErrorSeverity::Info,

            ErrorCode::NetworkError
            | ErrorCode::HttpStatusError
            | ErrorCode::FormatError
            | ErrorCode::RelayError
            | ErrorCode::ExhaustedFallback
            | ErrorCode::BackendRejected => ErrorSeverity::Warning,

            ErrorCode::StorageError | ErrorCode::SerializationError => ErrorSeverity::Error,

            ErrorCode::InvalidState => ErrorSeverity::Critical,
        }
    }

    /// Whether a manual retry of the same operation can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkError
                | ErrorCode::HttpStatusError
                | ErrorCode::RelayError
                | ErrorCode::ExhaustedFallback
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Invalid JSON: {0}")]
    Format(String),

    #[error("Relay returned HTML instead of JSON: {0}")]
    Relay(String),

    #[error("All {attempts} attempts failed")]
    ExhaustedFallback {
        attempts: usize,
        last: Option<Box<DomainError>>,
    },

    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::Network(_) => ErrorCode::NetworkError,
            DomainError::HttpStatus { .. } => ErrorCode::HttpStatusError,
            DomainError::Format(_) => ErrorCode::FormatError,
            DomainError::Relay(_) => ErrorCode::RelayError,
            DomainError::ExhaustedFallback { .. } => ErrorCode::ExhaustedFallback,
            DomainError::Rejected(_) => ErrorCode::BackendRejected,
            DomainError::Storage(_) => ErrorCode::StorageError,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::InvalidState(_) => ErrorCode::InvalidState,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }

    /// The error that decides which message category the user sees.
    ///
    /// An exhausted fallback chain reports the category of the last error it
    /// observed, nested chains included.
    pub fn root_cause(&self) -> &DomainError {
        match self {
            DomainError::ExhaustedFallback {
                last: Some(last), ..
            } => last.root_cause(),
            other => other,
        }
    }

    /// Human-readable message surfaced in the UI
    pub fn user_message(&self) -> String {
        match self.root_cause() {
            DomainError::Validation(msg) | DomainError::Rejected(msg) => msg.clone(),
            DomainError::Relay(_) => "Backend Error: Server is returning HTML instead of JSON. \
                 Please check your PHP backend configuration."
                .to_string(),
            DomainError::HttpStatus { .. } => "Server Error: Backend returned an HTTP error. \
                 Please check if the server is running."
                .to_string(),
            DomainError::Format(_) => "Format Error: Backend response is not valid JSON. \
                 Please check your PHP script."
                .to_string(),
            DomainError::Network(_) => "Network Error: Cannot connect to backend. \
                 Please check your internet connection."
                .to_string(),
            DomainError::ExhaustedFallback { .. } => {
                "Connection Error: All attempts to reach the backend failed.".to_string()
            }
            DomainError::Storage(msg)
            | DomainError::Serialization(msg)
            | DomainError::InvalidState(msg) => format!("Error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(DomainError::Validation("x".into()).code().code(), 1001);
        assert_eq!(DomainError::HttpStatus { status: 500 }.code().code(), 2002);
        assert_eq!(DomainError::Relay("x".into()).code().code(), 2004);
    }

    #[test]
    fn test_user_message_categories_are_distinct() {
        let messages = [
            DomainError::Network("dns".into()).user_message(),
            DomainError::HttpStatus { status: 502 }.user_message(),
            DomainError::Format("eof".into()).user_message(),
            DomainError::Relay("<html>".into()).user_message(),
            DomainError::ExhaustedFallback {
                attempts: 5,
                last: None,
            }
            .user_message(),
        ];

        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_exhausted_fallback_reports_last_error_category() {
        let error = DomainError::ExhaustedFallback {
            attempts: 5,
            last: Some(Box::new(DomainError::Relay("<!DOCTYPE html>".into()))),
        };

        assert_eq!(
            error.user_message(),
            DomainError::Relay(String::new()).user_message()
        );
        assert_eq!(error.code(), ErrorCode::ExhaustedFallback);
    }

    #[test]
    fn test_validation_message_is_shown_verbatim() {
        let error = DomainError::Validation("Please fill in both fields.".into());
        assert_eq!(error.user_message(), "Please fill in both fields.");
        assert_eq!(error.severity(), ErrorSeverity::Info);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_rejected_shows_backend_message() {
        let error = DomainError::Rejected("Image not found".into());
        assert_eq!(error.user_message(), "Image not found");
        assert_eq!(error.code().code(), 2006);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_format_with_code() {
        let error = DomainError::HttpStatus { status: 404 };
        assert_eq!(error.format_with_code(), "[2002] HTTP 404");
    }
}
