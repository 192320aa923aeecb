use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::models::{DataResponse, Stream, User};
use crate::rate_limiter::RateLimiter;
use crate::HelixError;

pub const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/helix/";

/// Static app credentials. Obtaining and refreshing the token happens elsewhere.
#[derive(Clone)]
pub struct HelixCredentials {
    pub client_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for HelixCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelixCredentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

pub struct HelixClient {
    client: Client,
    base_url: String,
    credentials: HelixCredentials,
    limiter: RateLimiter,
}

impl HelixClient {
    pub fn new(client: Client, credentials: HelixCredentials) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            limiter: RateLimiter::default(),
        }
    }

    /// Point the client at another Helix-compatible endpoint (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, HelixError> {
        let url = Url::parse(base_url)?;
        let mut base = url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base_url = base;
        Ok(self)
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Current stream of `login`, or `None` when the channel is offline.
    pub async fn get_stream(&self, login: &str) -> Result<Option<Stream>, HelixError> {
        let streams: Vec<Stream> = self.get_data("streams", &[("user_login", login)]).await?;
        Ok(streams.into_iter().find(Stream::is_live))
    }

    /// User record for `login`, or `None` when no such user exists.
    pub async fn get_user(&self, login: &str) -> Result<Option<User>, HelixError> {
        let users: Vec<User> = self.get_data("users", &[("login", login)]).await?;
        Ok(users.into_iter().next())
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, HelixError> {
        let url = self.endpoint_url(endpoint, query)?;

        let waited = self.limiter.acquire().await;
        if !waited.is_zero() {
            debug!(endpoint, waited = ?waited, "waited for helix rate limit token");
        }

        let response = self
            .client
            .get(url)
            .header("Client-Id", &self.credentials.client_id)
            .bearer_auth(&self.credentials.access_token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.text().await?;
        let parsed: DataResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.data)
    }

    fn endpoint_url(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Url, HelixError> {
        let mut url = Url::parse(&self.base_url)?.join(endpoint)?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }
}

async fn check_status(response: Response) -> Result<Response, HelixError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("Ratelimit-Reset")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| retry_after_from_reset(value, chrono::Utc::now().timestamp()));
            Err(HelixError::RateLimited { retry_after })
        }
        StatusCode::UNAUTHORIZED => {
            let body = response.text().await.unwrap_or_default();
            Err(HelixError::Unauthorized(body))
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(HelixError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Helix reports the bucket refill as a unix timestamp in `Ratelimit-Reset`.
fn retry_after_from_reset(reset: &str, now_unix: i64) -> Option<Duration> {
    let reset = reset.trim().parse::<i64>().ok()?;
    Some(Duration::from_secs(reset.saturating_sub(now_unix).max(0) as u64))
}
