mod app;
mod color;
mod state;
mod ui;

use anyhow::Context;
use app::EnemDashboardApp;
use eframe::egui;
use enem_dashboard::{load_table, DashboardConfig};
use state::{AppState, MapLayer};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;
    let table = load_table(&config).context("loading the yearly exam batches")?;
    log::info!(
        "Unified table: {} rows from {} batches",
        table.len(),
        table.batches.len()
    );
    let map = MapLayer::fetch(&config.boundaries_url);
    let state = AppState::new(config, table, map);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 900.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dashboard ENEM - Interativo",
        options,
        Box::new(|_cc| Ok(Box::new(EnemDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
