//! Runtime configuration loaded from environment variables.
//!
//! Supported env vars:
//! - `TWITCH_CLIENT_ID`, `TWITCH_ACCESS_TOKEN` (required)
//! - `DISCORD_WEBHOOK_URL` (required), `DISCORD_USERNAME`, `DISCORD_MENTION`
//! - `WATCHLIST_PATH`, `WATCHLIST` (comma separated seed for an empty store)
//! - `POLL_INTERVAL_SECS`, `METADATA_REFRESH_INTERVAL_SECS`,
//!   `PRESENCE_ROTATION_INTERVAL_SECS`, `REQUEST_TIMEOUT_SECS`
//! - `MAX_CONCURRENT_REQUESTS`, `TWITCH_RATE_LIMIT_RPS`
//! - `API_BIND_ADDR` (empty disables the admin API)
//! - `CLEANUP_ON_SHUTDOWN`, `LOG_DIR`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use twitch_helix::HelixCredentials;
use url::Url;

use crate::notification::{DiscordConfig, RenderConfig};
use crate::reconciler::ReconcilerConfig;
use crate::{Error, Result};

pub const DEFAULT_API_BIND_ADDR: &str = "127.0.0.1:12556";
pub const DEFAULT_WATCHLIST_PATH: &str = "watchlist.json";
pub const DEFAULT_DISCORD_USERNAME: &str = "streamwatch";

#[derive(Debug, Clone)]
pub struct StreamwatchConfig {
    pub twitch: HelixCredentials,
    pub twitch_rate_limit_rps: f64,
    pub discord: DiscordConfig,
    pub render: RenderConfig,
    pub watchlist_path: PathBuf,
    /// Ids used when the stored watchlist is empty.
    pub watchlist_seed: Vec<String>,
    pub reconciler: ReconcilerConfig,
    pub presence_rotation_interval: Duration,
    /// `None` disables the admin API.
    pub api_bind_addr: Option<SocketAddr>,
    pub cleanup_on_shutdown: bool,
    pub log_dir: Option<PathBuf>,
}

impl StreamwatchConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| get(key).ok_or_else(|| Error::config(format!("{key} is not set")));

        let twitch = HelixCredentials {
            client_id: required("TWITCH_CLIENT_ID")?,
            access_token: required("TWITCH_ACCESS_TOKEN")?,
        };

        let webhook_url = required("DISCORD_WEBHOOK_URL")?;
        Url::parse(&webhook_url)
            .map_err(|e| Error::config(format!("DISCORD_WEBHOOK_URL is not a valid URL: {e}")))?;
        let discord = DiscordConfig {
            webhook_url,
            username: Some(
                get("DISCORD_USERNAME").unwrap_or_else(|| DEFAULT_DISCORD_USERNAME.to_string()),
            ),
            avatar_url: None,
        };

        let render = RenderConfig {
            mention: get("DISCORD_MENTION"),
            ..Default::default()
        };

        let defaults = ReconcilerConfig::default();
        let reconciler = ReconcilerConfig {
            poll_interval: seconds(&get, "POLL_INTERVAL_SECS", defaults.poll_interval)?,
            metadata_refresh_interval: seconds(
                &get,
                "METADATA_REFRESH_INTERVAL_SECS",
                defaults.metadata_refresh_interval,
            )?,
            request_timeout: seconds(&get, "REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            max_concurrent_requests: parsed(
                &get,
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            )?,
        };
        if reconciler.max_concurrent_requests == 0 {
            return Err(Error::config("MAX_CONCURRENT_REQUESTS must be at least 1"));
        }

        let twitch_rate_limit_rps: f64 = parsed(&get, "TWITCH_RATE_LIMIT_RPS", 10.0)?;
        if !twitch_rate_limit_rps.is_finite() || twitch_rate_limit_rps <= 0.0 {
            return Err(Error::config(
                "TWITCH_RATE_LIMIT_RPS must be a positive number",
            ));
        }

        let api_bind_addr = match lookup("API_BIND_ADDR") {
            Some(addr) if addr.trim().is_empty() => None,
            Some(addr) => Some(parse_addr(addr.trim())?),
            None => Some(parse_addr(DEFAULT_API_BIND_ADDR)?),
        };

        Ok(Self {
            twitch,
            twitch_rate_limit_rps,
            discord,
            render,
            watchlist_path: get("WATCHLIST_PATH")
                .unwrap_or_else(|| DEFAULT_WATCHLIST_PATH.to_string())
                .into(),
            watchlist_seed: get("WATCHLIST")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            reconciler,
            presence_rotation_interval: seconds(
                &get,
                "PRESENCE_ROTATION_INTERVAL_SECS",
                Duration::from_secs(30),
            )?,
            api_bind_addr,
            cleanup_on_shutdown: flag(&get, "CLEANUP_ON_SHUTDOWN", true)?,
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parsed<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::config(format!("{key}: invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}

fn seconds<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = parsed(get, key, default.as_secs())?;
    if secs == 0 {
        return Err(Error::config(format!("{key} must be greater than 0")));
    }
    Ok(Duration::from_secs(secs))
}

fn flag<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(Error::config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|e| Error::config(format!("API_BIND_ADDR: invalid address '{addr}': {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            ("TWITCH_CLIENT_ID", "client"),
            ("TWITCH_ACCESS_TOKEN", "token"),
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        map
    }

    fn load(map: &HashMap<String, String>) -> Result<StreamwatchConfig> {
        StreamwatchConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&env(&[])).unwrap();

        assert_eq!(config.reconciler.poll_interval, Duration::from_secs(60));
        assert_eq!(
            config.reconciler.metadata_refresh_interval,
            Duration::from_secs(300)
        );
        assert_eq!(config.reconciler.request_timeout, Duration::from_secs(10));
        assert_eq!(config.reconciler.max_concurrent_requests, 8);
        assert_eq!(config.presence_rotation_interval, Duration::from_secs(30));
        assert_eq!(config.twitch_rate_limit_rps, 10.0);
        assert_eq!(config.discord.username.as_deref(), Some("streamwatch"));
        assert_eq!(config.render.mention, None);
        assert_eq!(config.watchlist_path, PathBuf::from("watchlist.json"));
        assert!(config.watchlist_seed.is_empty());
        assert_eq!(
            config.api_bind_addr,
            Some("127.0.0.1:12556".parse().unwrap())
        );
        assert!(config.cleanup_on_shutdown);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&env(&[
            ("POLL_INTERVAL_SECS", "15"),
            ("DISCORD_MENTION", "@everyone"),
            ("WATCHLIST", "alice, bob,,carol "),
            ("API_BIND_ADDR", ""),
            ("CLEANUP_ON_SHUTDOWN", "off"),
            ("LOG_DIR", "/var/log/streamwatch"),
        ]))
        .unwrap();

        assert_eq!(config.reconciler.poll_interval, Duration::from_secs(15));
        assert_eq!(config.render.mention.as_deref(), Some("@everyone"));
        assert_eq!(config.watchlist_seed, vec!["alice", "bob", "carol"]);
        assert!(config.api_bind_addr.is_none());
        assert!(!config.cleanup_on_shutdown);
        assert_eq!(
            config.log_dir,
            Some(PathBuf::from("/var/log/streamwatch"))
        );
    }

    #[test]
    fn test_missing_required() {
        let mut map = env(&[]);
        map.remove("DISCORD_WEBHOOK_URL");

        let err = load(&map).unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("DISCORD_WEBHOOK_URL")));
    }

    #[test]
    fn test_invalid_values() {
        for pairs in [
            [("POLL_INTERVAL_SECS", "0")],
            [("REQUEST_TIMEOUT_SECS", "soon")],
            [("MAX_CONCURRENT_REQUESTS", "0")],
            [("TWITCH_RATE_LIMIT_RPS", "-1")],
            [("TWITCH_RATE_LIMIT_RPS", "NaN")],
            [("API_BIND_ADDR", "localhost")],
            [("CLEANUP_ON_SHUTDOWN", "maybe")],
            [("DISCORD_WEBHOOK_URL", "not a url")],
        ] {
            let result = load(&env(&pairs));
            assert!(
                matches!(result, Err(Error::Configuration(_))),
                "{pairs:?} should be rejected"
            );
        }
    }
}
