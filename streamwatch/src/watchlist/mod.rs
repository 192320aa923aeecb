//! The set of watched channel ids.

mod manager;
mod store;

pub use manager::{WatchlistManager, normalize_id};
pub use store::{JsonFileStore, MemoryStore, WatchlistStore};
