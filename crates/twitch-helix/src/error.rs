use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HelixError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HelixError {
    /// Whether retrying the same request later can succeed without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            HelixError::Http(_) | HelixError::RateLimited { .. } => true,
            HelixError::Status { status, .. } => *status >= 500,
            HelixError::Json(_)
            | HelixError::InvalidUrl(_)
            | HelixError::Unauthorized(_)
            | HelixError::InvalidConfig(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HelixError::RateLimited { retry_after: None }.is_transient());
        assert!(
            HelixError::Status {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !HelixError::Status {
                status: 400,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!HelixError::Unauthorized("expired".to_string()).is_transient());
    }
}
