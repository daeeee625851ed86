//! Bridges the market data provider and whatever presents its data.

pub mod detail;
pub mod list;

#[cfg(test)]
pub(crate) mod testing;

pub use detail::{CompletionPolicy, DetailCoordinator, DetailPhase, DetailState};
pub use list::{ListCoordinator, RefreshHandle};
