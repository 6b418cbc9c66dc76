use lookbook_domain::DomainError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single attempt, or of the whole chain
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Invalid JSON: {0}")]
    Format(String),

    #[error("Proxy returned HTML instead of JSON")]
    Html,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("All {attempts} attempts failed")]
    Exhausted {
        attempts: usize,
        last: Option<Box<FetchError>>,
    },
}

impl FetchError {
    /// Classify a reqwest failure.
    ///
    /// The request URL is stripped from the message; it may carry credentials.
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        let error = error.without_url();
        if error.is_timeout() {
            FetchError::Timeout(timeout)
        } else if let Some(status) = error.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if error.is_decode() {
            FetchError::Format(error.to_string())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

impl From<FetchError> for DomainError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Network(msg) => DomainError::Network(msg),
            FetchError::Timeout(after) => DomainError::Network(format!("timed out after {after:?}")),
            FetchError::HttpStatus(status) => DomainError::HttpStatus { status },
            FetchError::Format(msg) => DomainError::Format(msg),
            FetchError::Html => DomainError::Relay("HTML document received".to_string()),
            FetchError::InvalidRequest(msg) => DomainError::Validation(msg),
            FetchError::Exhausted { attempts, last } => DomainError::ExhaustedFallback {
                attempts,
                last: last.map(|e| Box::new(DomainError::from(*e))),
            },
        }
    }
}
