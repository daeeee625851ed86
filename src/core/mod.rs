//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod market;
pub mod view;

// Re-export main types for cleaner imports
pub use market::{AssetSnapshot, FetchError, MarketDataProvider, PricePoint, TimeWindow};
