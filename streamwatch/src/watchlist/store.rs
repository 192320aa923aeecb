//! Persistence backends for the watchlist.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::Result;

/// Where the watchlist is persisted between restarts.
#[async_trait]
pub trait WatchlistStore: Send + Sync + 'static {
    /// Stored ids, or an empty list when nothing was stored yet.
    async fn load(&self) -> Result<Vec<String>>;

    /// Replace the stored list.
    async fn save(&self, ids: &[String]) -> Result<()>;
}

/// Stores the watchlist as a JSON array of ids.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so a crash never leaves a truncated list.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WatchlistStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No watchlist file yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, ids: &[String]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(ids)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&dir)?;

            let mut file = tempfile::NamedTempFile::new_in(&dir)?;
            file.write_all(&bytes)?;
            file.as_file().sync_all()?;
            file.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| crate::Error::Other(format!("watchlist save task failed: {}", e)))??;

        debug!(path = %self.path.display(), count = ids.len(), "Watchlist saved");
        Ok(())
    }
}

/// Keeps the list in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            ids: Mutex::new(ids),
        }
    }

    pub fn stored(&self) -> Vec<String> {
        self.ids.lock().clone()
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn load(&self) -> Result<Vec<String>> {
        Ok(self.ids.lock().clone())
    }

    async fn save(&self, ids: &[String]) -> Result<()> {
        *self.ids.lock() = ids.to_vec();
        Ok(())
    }
}
