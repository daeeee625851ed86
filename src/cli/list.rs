use super::ui;
use crate::coordinator::ListCoordinator;
use crate::core::AssetSnapshot;
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub fn render_table(assets: &[AssetSnapshot], query: &str) -> String {
    if assets.is_empty() {
        let message = if query.is_empty() {
            "No market data available."
        } else {
            "No assets match the search."
        };
        return ui::style_text(message, ui::StyleType::Error);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
        ui::header_cell("Price (USD)"),
        ui::header_cell("24h"),
        ui::header_cell("Market Cap"),
    ]);

    for asset in assets {
        table.add_row(vec![
            ui::format_optional_cell(asset.market_cap_rank, |r| r.to_string()),
            Cell::new(&asset.name),
            Cell::new(asset.symbol.to_uppercase()),
            ui::format_optional_cell(asset.current_price, ui::format_usd),
            ui::change_cell(asset.price_change_percentage_24h),
            ui::format_optional_cell(asset.market_cap, ui::format_usd),
        ]);
    }

    table.to_string()
}

fn print_listing(assets: &[AssetSnapshot], query: &str) {
    println!("{}\n", ui::style_text("Crypto Markets", ui::StyleType::Title));
    println!("{}", render_table(assets, query));
}

pub async fn run(coordinator: &ListCoordinator, query: &str) -> Result<()> {
    let spinner = ui::new_spinner("Fetching market data...");
    coordinator.refresh().await;
    spinner.finish_and_clear();

    print_listing(&coordinator.filtered(query).await, query);
    Ok(())
}

/// Redraws the listing after every periodic refresh until Ctrl-C.
pub async fn watch(coordinator: Arc<ListCoordinator>, query: &str, every: Duration) -> Result<()> {
    let mut updates = coordinator.subscribe();
    let handle = coordinator.start_auto_refresh(every);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let revision = *updates.borrow_and_update();
                debug!(revision, "Listing refreshed");
                let _ = console::Term::stdout().clear_screen();
                print_listing(&coordinator.filtered(query).await, query);
                let footer = format!("Refreshing every {}s. Ctrl-C to exit.", every.as_secs());
                println!("\n{}", ui::style_text(&footer, ui::StyleType::Subtle));
            }
        }
    }

    handle.stop().await;
    Ok(())
}
