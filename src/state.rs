use std::path::PathBuf;

use enem_dashboard::data::model::{RaceColor, Sex};
use enem_dashboard::geo::StateBoundaries;
use enem_dashboard::{load_table, DashboardConfig, DashboardViews, ExamTable, FilterSelection};

// ---------------------------------------------------------------------------
// Map layer
// ---------------------------------------------------------------------------

/// The boundary document, fetched once per session. Failure only disables
/// the map.
pub enum MapLayer {
    Ready(StateBoundaries),
    Unavailable(String),
}

impl MapLayer {
    pub fn fetch(url: &str) -> Self {
        match StateBoundaries::fetch(url) {
            Ok(boundaries) => {
                log::info!("Loaded {} state boundaries", boundaries.shapes.len());
                MapLayer::Ready(boundaries)
            }
            Err(e) => {
                log::error!("{e}");
                MapLayer::Unavailable(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// The unified table, immutable until a new data folder is loaded.
    pub table: ExamTable,

    /// Current year/sex/race selection.
    pub selection: FilterSelection,

    /// Views for `selection` (cached until the selection changes).
    pub views: DashboardViews,

    pub map: MapLayer,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig, table: ExamTable, map: MapLayer) -> Self {
        let selection = FilterSelection::initial(&table);
        let views = DashboardViews::compute(&table, &selection);
        Self {
            config,
            table,
            selection,
            views,
            map,
            status_message: None,
        }
    }

    /// Recompute every view after a selection change.
    pub fn refresh(&mut self) {
        self.views = DashboardViews::compute(&self.table, &self.selection);
        log::debug!(
            "Recomputed views: {} years, {} sexes, {} races -> {} rows",
            self.selection.years.len(),
            self.selection.sexes.len(),
            self.selection.races.len(),
            self.views.filtered_rows
        );
    }

    pub fn toggle_year(&mut self, year: i32) {
        self.selection.toggle_year(year);
        self.refresh();
    }

    pub fn toggle_sex(&mut self, sex: &Sex) {
        self.selection.toggle_sex(sex);
        self.refresh();
    }

    pub fn toggle_race(&mut self, race: &RaceColor) {
        self.selection.toggle_race(race);
        self.refresh();
    }

    pub fn select_all_years(&mut self) {
        self.selection.years = self.table.years.iter().copied().collect();
        self.refresh();
    }

    pub fn select_no_years(&mut self) {
        self.selection.years.clear();
        self.refresh();
    }

    pub fn select_all_sexes(&mut self) {
        self.selection.sexes = self.table.sexes.clone();
        self.refresh();
    }

    pub fn select_no_sexes(&mut self) {
        self.selection.sexes.clear();
        self.refresh();
    }

    pub fn select_all_races(&mut self) {
        self.selection.races = self.table.races.clone();
        self.refresh();
    }

    pub fn select_no_races(&mut self) {
        self.selection.races.clear();
        self.refresh();
    }

    /// Load the yearly batches from another folder. On failure the current
    /// table stays in place.
    pub fn reload_from(&mut self, data_dir: PathBuf) {
        let config = self.config.with_data_dir(data_dir);
        match load_table(&config) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows from {}",
                    table.len(),
                    config.data_dir.display()
                );
                self.selection = FilterSelection::initial(&table);
                self.table = table;
                self.config = config;
                self.status_message = None;
                self.refresh();
            }
            Err(e) => {
                log::error!("Failed to load data folder: {e}");
                self.status_message = Some(format!("Erro: {e}"));
            }
        }
    }

    pub fn retry_map(&mut self) {
        self.map = MapLayer::fetch(&self.config.boundaries_url);
    }
}
