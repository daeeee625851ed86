//! Pure derivations over held market state

use super::market::{AssetSnapshot, PricePoint, TimeWindow};
use chrono::{TimeZone, Utc};

/// Maximum number of time labels shown under a chart.
pub const MAX_LABELS: usize = 6;

/// Case-insensitive substring match on name or symbol. Empty query keeps everything.
pub fn filter_assets(assets: &[AssetSnapshot], query: &str) -> Vec<AssetSnapshot> {
    if query.is_empty() {
        return assets.to_vec();
    }
    let needle = query.to_lowercase();
    assets
        .iter()
        .filter(|a| {
            a.name.to_lowercase().contains(&needle) || a.symbol.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Indices of every Nth point, N = ceil(len / MAX_LABELS).
pub fn label_indices(len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let step = len.div_ceil(MAX_LABELS);
    (0..len).step_by(step).collect()
}

pub fn sample_labels(series: &[PricePoint], window: TimeWindow) -> Vec<String> {
    label_indices(series.len())
        .into_iter()
        .map(|i| format_label(series[i].timestamp_ms, window))
        .collect()
}

pub fn format_label(timestamp_ms: i64, window: TimeWindow) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format(window.label_format()).to_string(),
        None => String::new(),
    }
}

pub fn series_prices(series: &[PricePoint]) -> Vec<f64> {
    series.iter().map(|p| p.price).collect()
}
