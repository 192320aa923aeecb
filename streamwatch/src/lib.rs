//! streamwatch mirrors the live status of watched Twitch channels into a
//! Discord channel: one announcement per live channel, edited while the
//! stream runs and deleted when it ends.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod presence;
pub mod reconciler;
pub mod services;
pub mod watchlist;

pub use error::{Error, Result};
