//! In-process provider with scripted responses and release gates.

use crate::core::market::{AssetSnapshot, FetchError, MarketDataProvider, PricePoint};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

type SeriesKey = (String, u32);

#[derive(Default)]
pub(crate) struct StubProvider {
    assets: Mutex<Option<Vec<AssetSnapshot>>>,
    series: Mutex<HashMap<SeriesKey, Vec<PricePoint>>>,
    gates: Mutex<HashMap<SeriesKey, oneshot::Receiver<()>>>,
    history_calls: Mutex<Vec<SeriesKey>>,
    snapshot_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` makes the listing fail with a 500.
    pub fn set_assets(&self, assets: Option<Vec<AssetSnapshot>>) {
        *self.assets.lock().unwrap() = assets;
    }

    pub fn with_series(self, asset_id: &str, days: u32, series: Vec<PricePoint>) -> Self {
        self.series
            .lock()
            .unwrap()
            .insert((asset_id.to_string(), days), series);
        self
    }

    /// Holds the next matching history request until the sender fires.
    pub fn gate(&self, asset_id: &str, days: u32) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert((asset_id.to_string(), days), rx);
        tx
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> Vec<SeriesKey> {
        self.history_calls.lock().unwrap().clone()
    }

    pub async fn wait_for_history_calls(&self, n: usize) {
        while self.history_calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn try_snapshot_list(&self) -> Result<Vec<AssetSnapshot>, FetchError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.assets
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Status {
                status: 500,
                url: "stub://coins/markets".to_string(),
            })
    }

    async fn try_historical_series(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let key = (asset_id.to_string(), days);
        self.history_calls.lock().unwrap().push(key.clone());

        let gate = self.gates.lock().unwrap().remove(&key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        Ok(self
            .series
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

pub(crate) fn asset(id: &str, symbol: &str, name: &str) -> AssetSnapshot {
    AssetSnapshot {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        image: Some(format!("https://example.com/{id}.png")),
        current_price: Some(1.0),
        price_change_percentage_24h: None,
        market_cap: None,
        market_cap_rank: None,
        total_volume: None,
        high_24h: None,
        low_24h: None,
        ath: None,
        ath_change_percentage: None,
        atl: None,
        atl_change_percentage: None,
        last_updated: None,
    }
}

pub(crate) fn points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| PricePoint {
            timestamp_ms: 1_700_000_000_000 + i as i64 * 3_600_000,
            price: *price,
        })
        .collect()
}
