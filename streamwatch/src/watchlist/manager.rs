//! Watchlist manager.
//!
//! Holds the in-memory set of watched ids with write-through persistence:
//! every change is saved to the [`WatchlistStore`] and rolled back if the
//! save fails.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::store::WatchlistStore;
use crate::Result;

/// Longest login Twitch accepts.
const MAX_ID_LEN: usize = 25;

/// Normalize a channel id: trimmed, lowercase, Twitch login characters only.
pub fn normalize_id(id: &str) -> Result<String> {
    let id = id.trim().trim_start_matches('@').to_ascii_lowercase();

    if id.is_empty() {
        return Err(crate::Error::validation("channel id must not be empty"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(crate::Error::validation(format!(
            "channel id '{}' is longer than {} characters",
            id, MAX_ID_LEN
        )));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(crate::Error::validation(format!(
            "channel id '{}' may only contain letters, digits and '_'",
            id
        )));
    }

    Ok(id)
}

pub struct WatchlistManager {
    ids: RwLock<BTreeSet<String>>,
    store: Arc<dyn WatchlistStore>,
    /// Serializes mutations so saves reach the store in order.
    write_lock: Mutex<()>,
}

impl WatchlistManager {
    /// Create an empty manager. Call [`WatchlistManager::load`] to read the store.
    pub fn new(store: Arc<dyn WatchlistStore>) -> Self {
        Self {
            ids: RwLock::new(BTreeSet::new()),
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the in-memory set with the stored list.
    ///
    /// Invalid stored ids are skipped with a warning rather than failing startup.
    pub async fn load(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let stored = self.store.load().await?;
        let mut ids = BTreeSet::new();
        for raw in stored {
            match normalize_id(&raw) {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(e) => warn!(id = %raw, error = %e, "Skipping invalid stored watchlist id"),
            }
        }

        let count = ids.len();
        *self.ids.write() = ids;
        info!("Loaded {} watched channels", count);
        Ok(count)
    }

    /// Add `id`. Returns `false` if it was already watched.
    pub async fn add(&self, id: &str) -> Result<bool> {
        let id = normalize_id(id)?;
        let _guard = self.write_lock.lock().await;

        let snapshot = {
            let mut ids = self.ids.write();
            if !ids.insert(id.clone()) {
                debug!(channel = %id, "Channel already watched");
                return Ok(false);
            }
            ids.iter().cloned().collect::<Vec<_>>()
        };

        if let Err(e) = self.store.save(&snapshot).await {
            self.ids.write().remove(&id);
            return Err(e);
        }

        info!(channel = %id, "Channel added to watchlist");
        Ok(true)
    }

    /// Remove `id`. Returns `false` if it was not watched.
    ///
    /// An existing notification is left alone; the reconciler removes it on
    /// its next tick.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let id = normalize_id(id)?;
        let _guard = self.write_lock.lock().await;

        let snapshot = {
            let mut ids = self.ids.write();
            if !ids.remove(&id) {
                debug!(channel = %id, "Channel was not watched");
                return Ok(false);
            }
            ids.iter().cloned().collect::<Vec<_>>()
        };

        if let Err(e) = self.store.save(&snapshot).await {
            self.ids.write().insert(id);
            return Err(e);
        }

        info!(channel = %id, "Channel removed from watchlist");
        Ok(true)
    }

    /// Snapshot of the watched ids.
    pub fn list(&self) -> BTreeSet<String> {
        self.ids.read().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.read().is_empty()
    }
}
