use crate::core::config::StaleResponses;
use crate::core::market::{MarketDataProvider, PricePoint, TimeWindow};
use crate::core::view;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Data lifecycle of the detail view: `Idle -> Loading -> {Populated | EmptyResult}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailPhase {
    #[default]
    Idle,
    Loading,
    Populated,
    EmptyResult,
}

/// Which historical response wins when requests overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Only the most recently issued request may update the series.
    #[default]
    LatestIssued,
    /// Whatever resolves last overwrites the series.
    LastResolved,
}

impl From<StaleResponses> for CompletionPolicy {
    fn from(value: StaleResponses) -> Self {
        match value {
            StaleResponses::Discard => CompletionPolicy::LatestIssued,
            StaleResponses::Apply => CompletionPolicy::LastResolved,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub asset_id: Option<String>,
    pub window: TimeWindow,
    pub series: Vec<PricePoint>,
    pub phase: DetailPhase,
    pub highlighted: Option<usize>,
}

struct Ticket {
    seq: u64,
    asset_id: String,
    window: TimeWindow,
}

#[derive(Default)]
struct Inner {
    state: DetailState,
    issued: u64,
}

impl Inner {
    fn begin(&mut self, asset_id: String) -> Ticket {
        self.issued += 1;
        self.state.phase = DetailPhase::Loading;
        self.state.highlighted = None;
        Ticket {
            seq: self.issued,
            asset_id,
            window: self.state.window,
        }
    }
}

/// Holds the historical series for the asset under view.
pub struct DetailCoordinator {
    provider: Arc<dyn MarketDataProvider>,
    policy: CompletionPolicy,
    inner: Mutex<Inner>,
}

impl DetailCoordinator {
    pub fn new(provider: Arc<dyn MarketDataProvider>, policy: CompletionPolicy) -> Self {
        Self {
            provider,
            policy,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Switches to another asset, resetting the window to the default.
    pub async fn view_asset(&self, asset_id: &str) -> DetailPhase {
        self.view_asset_over(asset_id, TimeWindow::default()).await
    }

    /// Switches to another asset and loads it over `window` with a single fetch.
    pub async fn view_asset_over(&self, asset_id: &str, window: TimeWindow) -> DetailPhase {
        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.state.asset_id = Some(asset_id.to_string());
            inner.state.window = window;
            inner.begin(asset_id.to_string())
        };
        self.load(ticket).await
    }

    /// Reloads the current asset over `window`. No-op while nothing is in view.
    pub async fn select_window(&self, window: TimeWindow) -> DetailPhase {
        let ticket = {
            let mut inner = self.inner.lock().await;
            let Some(asset_id) = inner.state.asset_id.clone() else {
                debug!(%window, "Window selected with no asset in view");
                return inner.state.phase;
            };
            inner.state.window = window;
            inner.begin(asset_id)
        };
        self.load(ticket).await
    }

    async fn load(&self, ticket: Ticket) -> DetailPhase {
        debug!(
            seq = ticket.seq,
            asset_id = %ticket.asset_id,
            window = %ticket.window,
            "Loading price history"
        );
        let series = self
            .provider
            .fetch_historical_series(&ticket.asset_id, ticket.window.days())
            .await;

        let mut inner = self.inner.lock().await;
        if self.policy == CompletionPolicy::LatestIssued && ticket.seq != inner.issued {
            debug!(
                seq = ticket.seq,
                latest = inner.issued,
                "Discarding superseded price history"
            );
            return inner.state.phase;
        }

        inner.state.phase = if series.is_empty() {
            DetailPhase::EmptyResult
        } else {
            DetailPhase::Populated
        };
        inner.state.series = series;
        inner.state.highlighted = None;
        inner.state.phase
    }

    pub async fn state(&self) -> DetailState {
        self.inner.lock().await.state.clone()
    }

    pub async fn phase(&self) -> DetailPhase {
        self.inner.lock().await.state.phase
    }

    /// Marks a point of the held series, returning it if the index is valid.
    pub async fn highlight(&self, index: usize) -> Option<PricePoint> {
        let mut inner = self.inner.lock().await;
        let point = inner.state.series.get(index).copied();
        inner.state.highlighted = point.map(|_| index);
        point
    }

    pub async fn clear_highlight(&self) {
        self.inner.lock().await.state.highlighted = None;
    }

    pub async fn labels(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        view::sample_labels(&inner.state.series, inner.state.window)
    }

    pub async fn prices(&self) -> Vec<f64> {
        view::series_prices(&self.inner.lock().await.state.series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{StubProvider, points};

    fn coordinator(stub: &Arc<StubProvider>, policy: CompletionPolicy) -> Arc<DetailCoordinator> {
        Arc::new(DetailCoordinator::new(stub.clone(), policy))
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let stub = Arc::new(StubProvider::new());
        let detail = coordinator(&stub, CompletionPolicy::default());

        let state = detail.state().await;
        assert_eq!(state.phase, DetailPhase::Idle);
        assert_eq!(state.window, TimeWindow::OneWeek);
        assert!(state.asset_id.is_none());
        assert!(detail.labels().await.is_empty());
    }

    #[tokio::test]
    async fn test_select_window_without_asset_is_noop() {
        let stub = Arc::new(StubProvider::new());
        let detail = coordinator(&stub, CompletionPolicy::default());

        assert_eq!(
            detail.select_window(TimeWindow::OneYear).await,
            DetailPhase::Idle
        );
        assert!(stub.history_calls().is_empty());
        assert_eq!(detail.state().await.window, TimeWindow::OneWeek);
    }

    #[tokio::test]
    async fn test_view_asset_populates_series() {
        let stub = Arc::new(StubProvider::new().with_series(
            "bitcoin",
            7,
            points(&[42000.5, 42100.0]),
        ));
        let detail = coordinator(&stub, CompletionPolicy::default());

        assert_eq!(detail.view_asset("bitcoin").await, DetailPhase::Populated);
        assert_eq!(stub.history_calls(), vec![("bitcoin".to_string(), 7)]);

        let state = detail.state().await;
        assert_eq!(state.series.len(), 2);
        assert_eq!(state.series[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(state.series[1].timestamp_ms, 1_700_003_600_000);
        assert_eq!(detail.prices().await, vec![42000.5, 42100.0]);
        assert_eq!(detail.labels().await, vec!["11/14", "11/14"]);
    }

    #[tokio::test]
    async fn test_empty_history_is_empty_result() {
        let stub = Arc::new(StubProvider::new());
        let detail = coordinator(&stub, CompletionPolicy::default());

        assert_eq!(detail.view_asset("bitcoin").await, DetailPhase::EmptyResult);
        assert!(detail.state().await.series.is_empty());
        assert!(detail.labels().await.is_empty());
    }

    #[tokio::test]
    async fn test_phase_is_loading_while_in_flight() {
        let stub = Arc::new(StubProvider::new().with_series("bitcoin", 7, points(&[1.0])));
        let detail = coordinator(&stub, CompletionPolicy::default());
        let release = stub.gate("bitcoin", 7);

        let pending = {
            let detail = Arc::clone(&detail);
            tokio::spawn(async move { detail.view_asset("bitcoin").await })
        };
        stub.wait_for_history_calls(1).await;
        assert_eq!(detail.phase().await, DetailPhase::Loading);

        release.send(()).unwrap();
        assert_eq!(pending.await.unwrap(), DetailPhase::Populated);
    }

    #[tokio::test]
    async fn test_switching_asset_resets_window_and_fetches_once() {
        let stub = Arc::new(
            StubProvider::new()
                .with_series("bitcoin", 365, points(&[1.0, 2.0]))
                .with_series("ethereum", 7, points(&[3.0])),
        );
        let detail = coordinator(&stub, CompletionPolicy::default());

        detail.view_asset("bitcoin").await;
        detail.select_window(TimeWindow::OneYear).await;
        assert_eq!(detail.state().await.window, TimeWindow::OneYear);

        let before = stub.history_calls().len();
        assert_eq!(detail.view_asset("ethereum").await, DetailPhase::Populated);

        let calls = stub.history_calls();
        assert_eq!(calls.len(), before + 1);
        assert_eq!(calls.last().unwrap(), &("ethereum".to_string(), 7));

        let state = detail.state().await;
        assert_eq!(state.asset_id.as_deref(), Some("ethereum"));
        assert_eq!(state.window, TimeWindow::OneWeek);
        assert_eq!(detail.prices().await, vec![3.0]);
    }

    #[tokio::test]
    async fn test_view_asset_over_window_fetches_once() {
        let stub = Arc::new(
            StubProvider::new()
                .with_series("bitcoin", 7, points(&[1.0]))
                .with_series("bitcoin", 30, points(&[2.0, 3.0])),
        );
        let detail = coordinator(&stub, CompletionPolicy::default());

        let phase = detail.view_asset_over("bitcoin", TimeWindow::OneMonth).await;
        assert_eq!(phase, DetailPhase::Populated);
        assert_eq!(stub.history_calls(), vec![("bitcoin".to_string(), 30)]);

        let state = detail.state().await;
        assert_eq!(state.window, TimeWindow::OneMonth);
        assert_eq!(view::series_prices(&state.series), vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_window_change_clears_highlight() {
        let stub = Arc::new(
            StubProvider::new()
                .with_series("bitcoin", 7, points(&[1.0, 2.0, 3.0]))
                .with_series("bitcoin", 30, points(&[4.0])),
        );
        let detail = coordinator(&stub, CompletionPolicy::default());
        detail.view_asset("bitcoin").await;

        assert_eq!(detail.highlight(2).await.unwrap().price, 3.0);
        assert_eq!(detail.state().await.highlighted, Some(2));

        detail.select_window(TimeWindow::OneMonth).await;
        let state = detail.state().await;
        assert!(state.highlighted.is_none());
        assert_eq!(state.phase, DetailPhase::Populated);
        assert!(detail.highlight(2).await.is_none());
        assert!(detail.state().await.highlighted.is_none());
    }

    #[tokio::test]
    async fn test_clear_highlight() {
        let stub = Arc::new(StubProvider::new().with_series("bitcoin", 7, points(&[1.0])));
        let detail = coordinator(&stub, CompletionPolicy::default());
        detail.view_asset("bitcoin").await;

        detail.highlight(0).await;
        detail.clear_highlight().await;
        assert!(detail.state().await.highlighted.is_none());
    }

    async fn race_year_against_day(policy: CompletionPolicy) -> DetailState {
        let stub = Arc::new(
            StubProvider::new()
                .with_series("bitcoin", 365, points(&[10.0, 20.0, 30.0]))
                .with_series("bitcoin", 1, points(&[99.0])),
        );
        let detail = coordinator(&stub, policy);
        detail.view_asset("bitcoin").await;

        let release_year = stub.gate("bitcoin", 365);
        let year = {
            let detail = Arc::clone(&detail);
            tokio::spawn(async move { detail.select_window(TimeWindow::OneYear).await })
        };
        stub.wait_for_history_calls(2).await;

        assert_eq!(
            detail.select_window(TimeWindow::OneDay).await,
            DetailPhase::Populated
        );
        assert_eq!(detail.prices().await, vec![99.0]);

        release_year.send(()).unwrap();
        year.await.unwrap();
        detail.state().await
    }

    #[tokio::test]
    async fn test_last_resolved_response_wins() {
        let state = race_year_against_day(CompletionPolicy::LastResolved).await;
        assert_eq!(view::series_prices(&state.series), vec![10.0, 20.0, 30.0]);
        assert_eq!(state.window, TimeWindow::OneDay);
    }

    #[tokio::test]
    async fn test_superseded_response_is_discarded() {
        let state = race_year_against_day(CompletionPolicy::LatestIssued).await;
        assert_eq!(view::series_prices(&state.series), vec![99.0]);
        assert_eq!(state.window, TimeWindow::OneDay);
        assert_eq!(state.phase, DetailPhase::Populated);
    }

    #[test]
    fn test_policy_from_config() {
        assert_eq!(
            CompletionPolicy::from(StaleResponses::Discard),
            CompletionPolicy::LatestIssued
        );
        assert_eq!(
            CompletionPolicy::from(StaleResponses::Apply),
            CompletionPolicy::LastResolved
        );
    }
}
