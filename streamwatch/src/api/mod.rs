//! Admin HTTP API.
//!
//! Small JSON API for operating a running instance: health, watchlist
//! management, the current live roster, manual ticks and the log filter.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, ApiServerConfig, AppState};
