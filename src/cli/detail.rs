use super::ui;
use crate::coordinator::{DetailCoordinator, DetailPhase, DetailState, ListCoordinator};
use crate::core::{AssetSnapshot, TimeWindow, view};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use futures::future::join;

fn stats_table(asset: &AssetSnapshot) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

    let usd = |value: Option<f64>| ui::format_optional_cell(value, ui::format_usd);
    let with_change = |value: Option<f64>, change: Option<f64>| {
        let text = match (value, change) {
            (Some(v), Some(c)) => Some(format!("{} ({c:.2}%)", ui::format_usd(v))),
            (Some(v), None) => Some(ui::format_usd(v)),
            _ => None,
        };
        ui::format_optional_cell(text, |s| s)
    };
    let change = ui::change_cell(asset.price_change_percentage_24h);
    let ath = with_change(asset.ath, asset.ath_change_percentage);
    let atl = with_change(asset.atl, asset.atl_change_percentage);
    let updated = ui::format_optional_cell(asset.last_updated, |t| {
        t.format("%Y-%m-%d %H:%M UTC").to_string()
    });

    let rows = vec![
        ("Price", usd(asset.current_price)),
        ("24h Change", change),
        ("Market Cap", usd(asset.market_cap)),
        ("Volume (24h)", usd(asset.total_volume)),
        ("High (24h)", usd(asset.high_24h)),
        ("Low (24h)", usd(asset.low_24h)),
        ("All-Time High", ath),
        ("All-Time Low", atl),
        ("Last Updated", updated),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), value]);
    }
    table.to_string()
}

fn history_table(state: &DetailState) -> String {
    match state.phase {
        DetailPhase::Idle | DetailPhase::Loading => {
            return ui::style_text("Loading price history...", ui::StyleType::Subtle);
        }
        DetailPhase::EmptyResult => {
            return ui::style_text("No historical data.", ui::StyleType::Error);
        }
        DetailPhase::Populated => {}
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Time (UTC)"), ui::header_cell("Price")]);

    let labels = view::sample_labels(&state.series, state.window);
    let indices = view::label_indices(state.series.len());
    for (label, index) in labels.into_iter().zip(indices) {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(ui::format_usd(state.series[index].price))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    if let Some(last) = state.series.last() {
        table.add_row(vec![
            Cell::new(ui::style_text("latest", ui::StyleType::Subtle)),
            Cell::new(ui::format_usd(last.price)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

pub fn render_detail(
    asset_id: &str,
    asset: Option<&AssetSnapshot>,
    state: &DetailState,
) -> String {
    let mut output = match asset {
        Some(asset) => format!(
            "{}\n\n{}\n\n",
            ui::style_text(
                &format!("{} ({})", asset.name, asset.symbol.to_uppercase()),
                ui::StyleType::Title
            ),
            stats_table(asset)
        ),
        None => format!(
            "{}\n{}\n\n",
            ui::style_text(asset_id, ui::StyleType::Title),
            ui::style_text("No market snapshot for this asset.", ui::StyleType::Error)
        ),
    };

    output.push_str(&format!(
        "{}\n",
        ui::style_text(
            &format!("Price history ({})", state.window),
            ui::StyleType::Label
        )
    ));
    output.push_str(&history_table(state));
    output
}

pub async fn run(
    list: &ListCoordinator,
    detail: &DetailCoordinator,
    asset_id: &str,
    window: TimeWindow,
) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching {asset_id}..."));
    join(list.refresh(), detail.view_asset_over(asset_id, window)).await;
    spinner.finish_and_clear();

    let asset = list.find(asset_id).await;
    let state = detail.state().await;
    println!("{}", render_detail(asset_id, asset.as_ref(), &state));
    Ok(())
}
