use crate::core::market::{AssetSnapshot, MarketDataProvider};
use crate::core::view;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Holds the latest asset listing and derives filtered views from it.
pub struct ListCoordinator {
    provider: Arc<dyn MarketDataProvider>,
    assets: Mutex<Vec<AssetSnapshot>>,
    revision: watch::Sender<u64>,
}

impl ListCoordinator {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            provider,
            assets: Mutex::new(Vec::new()),
            revision,
        }
    }

    /// Fetches a fresh listing and replaces the held one, even when empty.
    pub async fn refresh(&self) -> usize {
        let assets = self.provider.fetch_snapshot_list().await;
        let count = assets.len();
        *self.assets.lock().await = assets;
        self.revision.send_modify(|r| *r += 1);
        debug!(count, "Replaced asset listing");
        count
    }

    pub async fn assets(&self) -> Vec<AssetSnapshot> {
        self.assets.lock().await.clone()
    }

    pub async fn filtered(&self, query: &str) -> Vec<AssetSnapshot> {
        let assets = self.assets.lock().await;
        view::filter_assets(&assets, query)
    }

    pub async fn find(&self, asset_id: &str) -> Option<AssetSnapshot> {
        self.assets
            .lock()
            .await
            .iter()
            .find(|a| a.id == asset_id)
            .cloned()
    }

    /// Revision counter bumped after every replace.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Refreshes now and then every `every` until the handle is stopped or dropped.
    pub fn start_auto_refresh(self: &Arc<Self>, every: Duration) -> RefreshHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let coordinator = Arc::clone(self);
        let every = every.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = cancelled.cancelled() => break,
                            _ = coordinator.refresh() => {}
                        }
                    }
                }
            }
            debug!("Auto refresh loop exited");
        });

        info!(interval_secs = every.as_secs_f64(), "Started auto refresh");
        RefreshHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owns the periodic refresh task. Dropping the handle cancels the timer.
pub struct RefreshHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("Stopped auto refresh");
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
