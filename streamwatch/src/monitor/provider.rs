use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use twitch_helix::HelixError;

use crate::domain::StreamStatus;

/// A failed status lookup.
///
/// Every variant means "no observation": the caller must keep its current
/// state and try again on the next tick, never infer "offline" from it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("authorization rejected: {0}")]
    Unauthorized(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Decode(String),
    /// Twitch refused the request itself; retrying unchanged will not help.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl FetchError {
    /// Whether the failure needs operator action rather than time.
    pub fn is_persistent(&self) -> bool {
        matches!(self, FetchError::Unauthorized(_) | FetchError::Rejected(_))
    }
}

impl From<HelixError> for FetchError {
    fn from(err: HelixError) -> Self {
        match err {
            HelixError::RateLimited { retry_after } => FetchError::RateLimited { retry_after },
            HelixError::Unauthorized(body) => FetchError::Unauthorized(body),
            HelixError::Json(e) => FetchError::Decode(e.to_string()),
            HelixError::Http(e) if e.is_timeout() => FetchError::Network(format!("timeout: {e}")),
            HelixError::Http(e) if e.is_decode() => FetchError::Decode(e.to_string()),
            other if !other.is_transient() => FetchError::Rejected(other.to_string()),
            other => FetchError::Network(other.to_string()),
        }
    }
}

/// Fetches the current status of one channel. Implementations hold no
/// per-channel state.
#[async_trait]
pub trait StatusProvider: Send + Sync + 'static {
    async fn fetch_status(&self, id: &str) -> Result<StreamStatus, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_helix_error() {
        assert_eq!(
            FetchError::from(HelixError::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }),
            FetchError::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }
        );
        assert!(matches!(
            FetchError::from(HelixError::Unauthorized("invalid token".to_string())),
            FetchError::Unauthorized(_)
        ));
        assert!(matches!(
            FetchError::from(HelixError::Status {
                status: 502,
                body: "bad gateway".to_string()
            }),
            FetchError::Network(_)
        ));
    }

    #[test]
    fn test_client_errors_are_rejections() {
        let err = FetchError::from(HelixError::Status {
            status: 400,
            body: "malformed query parameter".to_string(),
        });
        assert!(matches!(&err, FetchError::Rejected(msg) if msg.contains("400")));
        assert!(err.is_persistent());

        let err = FetchError::from(HelixError::InvalidConfig("bad base URL".to_string()));
        assert!(matches!(err, FetchError::Rejected(_)));

        assert!(FetchError::Unauthorized("expired".to_string()).is_persistent());
        assert!(!FetchError::Network("reset".to_string()).is_persistent());
        assert!(!FetchError::Timeout(Duration::from_secs(1)).is_persistent());
    }
}
