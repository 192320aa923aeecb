//! Service container.
//!
//! Builds every component from a [`StreamwatchConfig`], runs the background
//! loops and shuts them down together.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use twitch_helix::{HelixClient, RateLimiter, RateLimiterConfig};

use crate::Result;
use crate::api::{ApiServer, ApiServerConfig, AppState};
use crate::config::StreamwatchConfig;
use crate::logging::LoggingConfig;
use crate::monitor::{HelixStatusProvider, StatusProvider};
use crate::notification::{DiscordWebhookSink, NotificationRenderer, NotificationSink};
use crate::presence::{PresenceScheduler, WatchPresenceDisplay};
use crate::reconciler::Reconciler;
use crate::watchlist::{JsonFileStore, WatchlistManager, WatchlistStore};

/// Default shutdown timeout.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ServiceContainer {
    pub config: StreamwatchConfig,
    pub watchlist: Arc<WatchlistManager>,
    pub reconciler: Arc<Reconciler>,
    pub presence: Arc<WatchPresenceDisplay>,
    logging_config: Option<Arc<LoggingConfig>>,
    cancellation_token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ServiceContainer {
    /// Build the production wiring: Helix provider, Discord webhook sink and
    /// the JSON watchlist file.
    pub fn new(config: StreamwatchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.reconciler.request_timeout)
            .user_agent(concat!("streamwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::Error::config(format!("failed to build HTTP client: {e}")))?;

        let limiter = RateLimiter::new(RateLimiterConfig::with_rps(config.twitch_rate_limit_rps)?);
        let helix = HelixClient::new(http.clone(), config.twitch.clone()).with_rate_limiter(limiter);
        let provider = Arc::new(HelixStatusProvider::new(helix));

        let sink = Arc::new(DiscordWebhookSink::new(config.discord.clone(), http)?);
        let store = Arc::new(JsonFileStore::new(config.watchlist_path.clone()));

        Ok(Self::with_components(config, provider, sink, store))
    }

    /// Build around caller supplied boundaries.
    pub fn with_components(
        config: StreamwatchConfig,
        provider: Arc<dyn StatusProvider>,
        sink: Arc<dyn NotificationSink>,
        store: Arc<dyn WatchlistStore>,
    ) -> Self {
        let watchlist = Arc::new(WatchlistManager::new(store));
        let reconciler = Arc::new(Reconciler::new(
            provider,
            sink,
            watchlist.clone(),
            NotificationRenderer::new(config.render.clone()),
            config.reconciler.clone(),
        ));

        Self {
            config,
            watchlist,
            reconciler,
            presence: Arc::new(WatchPresenceDisplay::new()),
            logging_config: None,
            cancellation_token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_logging_config(mut self, logging_config: Arc<LoggingConfig>) -> Self {
        self.logging_config = Some(logging_config);
        self
    }

    /// Load the watchlist, seeding an empty store from the configured list.
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing services");

        let count = self.watchlist.load().await?;
        if count == 0 && !self.config.watchlist_seed.is_empty() {
            for id in &self.config.watchlist_seed {
                if let Err(e) = self.watchlist.add(id).await {
                    warn!(channel = %id, error = %e, "Skipping invalid seed channel");
                }
            }
            info!(count = self.watchlist.len(), "Seeded watchlist");
        }

        if let Some(logging_config) = &self.logging_config {
            logging_config.start_retention_cleanup(self.cancellation_token.clone());
        }

        info!("Services initialized");
        Ok(())
    }

    /// Spawn the tick loop, the presence rotation and the admin API.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();

        let reconciler = self.reconciler.clone();
        tasks.push(tokio::spawn(
            reconciler.run(self.cancellation_token.clone()),
        ));

        let scheduler = PresenceScheduler::new(self.reconciler.subscribe(), self.presence.clone());
        tasks.push(tokio::spawn(scheduler.run(
            self.config.presence_rotation_interval,
            self.cancellation_token.clone(),
        )));

        if let Some(bind_addr) = self.config.api_bind_addr {
            let mut state = AppState::new(self.watchlist.clone(), self.reconciler.clone());
            if let Some(logging_config) = &self.logging_config {
                state = state.with_logging_config(logging_config.clone());
            }
            let server = ApiServer::new(
                ApiServerConfig::new(bind_addr),
                state,
                self.cancellation_token.clone(),
            );
            tasks.push(tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    error!(error = %e, "API server failed");
                }
            }));
        } else {
            debug!("Admin API disabled");
        }

        info!(
            watched = self.watchlist.len(),
            poll_interval = ?self.config.reconciler.poll_interval,
            "Services started"
        );
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Stop the background loops, then remove live notifications if
    /// configured to.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        info!("Shutting down services (timeout: {:?})", timeout);

        self.cancellation_token.cancel();

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        let joined = tokio::time::timeout(timeout, futures::future::join_all(tasks)).await;
        if joined.is_err() {
            warn!("Shutdown timeout reached, forcing shutdown");
        }

        if self.config.cleanup_on_shutdown {
            let removed = tokio::time::timeout(timeout, self.reconciler.clear_notifications()).await;
            if removed.is_err() {
                warn!("Timed out removing live notifications");
            }
        }

        info!("Services shut down");
        Ok(())
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
