//! Status source for watched channels.
//!
//! The reconciler only sees the [`StatusProvider`] trait; the Helix-backed
//! implementation lives in [`twitch`].

mod provider;
mod twitch;

pub use provider::{FetchError, StatusProvider};
pub use twitch::{HelixStatusProvider, PREVIEW_HEIGHT, PREVIEW_WIDTH};
