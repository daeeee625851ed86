pub mod cli;
pub mod coordinator;
pub mod core;
pub mod providers;

use crate::coordinator::{CompletionPolicy, DetailCoordinator, ListCoordinator};
use crate::core::TimeWindow;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    List {
        search: Option<String>,
        watch: bool,
    },
    Detail {
        asset_id: String,
        window: TimeWindow,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Crypto Tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = Arc::new(providers::CoinGeckoProvider::new(
        config.coingecko_base_url(),
        config.request_timeout(),
    ));
    let list = Arc::new(ListCoordinator::new(provider.clone()));

    match command {
        AppCommand::List { search, watch } => {
            let query = search.unwrap_or_default();
            if watch {
                cli::list::watch(list, &query, config.refresh_interval()).await
            } else {
                cli::list::run(&list, &query).await
            }
        }
        AppCommand::Detail { asset_id, window } => {
            let detail =
                DetailCoordinator::new(provider, CompletionPolicy::from(config.stale_responses));
            cli::detail::run(&list, &detail, &asset_id, window).await
        }
    }
}
