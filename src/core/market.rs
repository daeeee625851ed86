//! Market data types and the provider abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// One tradable asset as listed by the provider at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub ath: Option<f64>,
    pub ath_change_percentage: Option<f64>,
    pub atl: Option<f64>,
    pub atl_change_percentage: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A single `(timestamp, price)` sample. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum TimeWindow {
    OneDay,
    #[default]
    OneWeek,
    OneMonth,
    ThreeMonths,
    OneYear,
    ThreeYears,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::OneDay,
        TimeWindow::OneWeek,
        TimeWindow::OneMonth,
        TimeWindow::ThreeMonths,
        TimeWindow::OneYear,
        TimeWindow::ThreeYears,
    ];

    pub fn days(&self) -> u32 {
        match self {
            TimeWindow::OneDay => 1,
            TimeWindow::OneWeek => 7,
            TimeWindow::OneMonth => 30,
            TimeWindow::ThreeMonths => 90,
            TimeWindow::OneYear => 365,
            TimeWindow::ThreeYears => 1095,
        }
    }

    /// `chrono` format string used for chart labels in this window.
    pub fn label_format(&self) -> &'static str {
        match self {
            TimeWindow::OneDay => "%H:%M",
            TimeWindow::OneWeek | TimeWindow::OneMonth | TimeWindow::ThreeMonths => "%-m/%-d",
            TimeWindow::OneYear | TimeWindow::ThreeYears => "%b %y",
        }
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TimeWindow::OneDay => "1D",
                TimeWindow::OneWeek => "7D",
                TimeWindow::OneMonth => "1M",
                TimeWindow::ThreeMonths => "3M",
                TimeWindow::OneYear => "1Y",
                TimeWindow::ThreeYears => "3Y",
            }
        )
    }
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(days) = s.parse::<u32>() {
            return TimeWindow::ALL
                .into_iter()
                .find(|w| w.days() == days)
                .ok_or_else(|| anyhow::anyhow!("Unsupported time window: {} days", days));
        }
        match s.to_uppercase().as_str() {
            "1D" => Ok(TimeWindow::OneDay),
            "7D" | "1W" => Ok(TimeWindow::OneWeek),
            "1M" => Ok(TimeWindow::OneMonth),
            "3M" => Ok(TimeWindow::ThreeMonths),
            "1Y" => Ok(TimeWindow::OneYear),
            "3Y" => Ok(TimeWindow::ThreeYears),
            _ => Err(anyhow::anyhow!("Invalid time window: {}", s)),
        }
    }
}

/// Why a fetch produced no data. Only visible below the fail-soft boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Payload(_) => "payload",
            FetchError::InvalidRequest(_) => "invalid_request",
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Lists assets in USD, ordered by market cap descending.
    async fn try_snapshot_list(&self) -> Result<Vec<AssetSnapshot>, FetchError>;

    async fn try_historical_series(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, FetchError>;

    /// Fail-soft listing: any failure is logged and yields an empty list.
    async fn fetch_snapshot_list(&self) -> Vec<AssetSnapshot> {
        match self.try_snapshot_list().await {
            Ok(assets) => assets,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Snapshot fetch failed");
                Vec::new()
            }
        }
    }

    /// Fail-soft history: any failure is logged and yields an empty series.
    async fn fetch_historical_series(&self, asset_id: &str, days: u32) -> Vec<PricePoint> {
        match self.try_historical_series(asset_id, days).await {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    error = %e,
                    kind = e.kind(),
                    asset_id,
                    days,
                    "Historical fetch failed"
                );
                Vec::new()
            }
        }
    }
}
