use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::market::{AssetSnapshot, FetchError, MarketDataProvider, PricePoint};

const USER_AGENT: &str = "cryptotracker/0.1";
const VS_CURRENCY: &str = "usd";

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Option<Vec<(f64, f64)>>,
}

pub struct CoinGeckoProvider {
    base_url: String,
    timeout: Duration,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Appends `segments` to the base path, each percent-encoded as a single segment.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            FetchError::InvalidRequest(format!("invalid base url {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::InvalidRequest(format!("base url has no path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        let response = client.get(url.clone()).send().await?;
        debug!(status = %response.status(), "Received CoinGecko response");

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoMarkets", skip(self))]
    async fn try_snapshot_list(&self) -> Result<Vec<AssetSnapshot>, FetchError> {
        let url = self.endpoint(
            &["coins", "markets"],
            &[("vs_currency", VS_CURRENCY), ("order", "market_cap_desc")],
        )?;
        debug!("Requesting market snapshot from {}", url);

        let text = self.get_text(url).await?;
        let assets: Vec<AssetSnapshot> = serde_json::from_str(&text)?;

        let total = assets.len();
        let assets: Vec<AssetSnapshot> = assets.into_iter().filter(|a| !a.id.is_empty()).collect();
        if assets.len() != total {
            warn!(
                dropped = total - assets.len(),
                "Dropped snapshot entries without an identifier"
            );
        }

        Ok(assets)
    }

    #[instrument(name = "CoinGeckoMarketChart", skip(self), fields(asset_id = %asset_id))]
    async fn try_historical_series(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>, FetchError> {
        if asset_id.trim().is_empty() {
            return Err(FetchError::InvalidRequest("empty asset id".to_string()));
        }
        if days == 0 {
            return Err(FetchError::InvalidRequest(
                "window must be at least one day".to_string(),
            ));
        }

        let days = days.to_string();
        let url = self.endpoint(
            &["coins", asset_id, "market_chart"],
            &[("vs_currency", VS_CURRENCY), ("days", days.as_str())],
        )?;
        debug!("Requesting price history from {}", url);

        let text = self.get_text(url).await?;
        let data: MarketChartResponse = serde_json::from_str(&text)?;

        let series = data
            .prices
            .unwrap_or_default()
            .into_iter()
            .map(|(ts, price)| PricePoint {
                timestamp_ms: ts as i64,
                price,
            })
            .collect();

        Ok(series)
    }
}
