//! Minimal Twitch Helix client.
//!
//! Covers the two lookups a live-status watcher needs: the current stream of a
//! channel and the channel's user record (for the profile image). Token
//! acquisition is left to the caller.

mod client;
mod error;
pub mod models;
pub mod rate_limiter;

pub use client::{DEFAULT_BASE_URL, HelixClient, HelixCredentials};
pub use error::HelixError;
pub use models::{Stream, User, fill_thumbnail_template};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
