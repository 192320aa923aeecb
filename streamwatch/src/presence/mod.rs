//! Presence rotation over the live roster.
//!
//! The scheduler cycles a "watching X" status through the channels that are
//! currently live. It only reads the reconciler's committed snapshot.

mod display;
mod scheduler;

pub use display::{PresenceActivity, PresenceDisplay, WatchPresenceDisplay};
pub use scheduler::PresenceScheduler;
