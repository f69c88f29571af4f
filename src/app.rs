use eframe::egui::{self, ScrollArea, Ui};

use crate::color;
use crate::state::AppState;
use crate::ui::{charts, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

/// Relative widths of the left, centre and right chart columns.
const COLUMN_WEIGHTS: [f32; 3] = [1.5, 4.5, 2.2];

pub struct EnemDashboardApp {
    pub state: AppState,
}

impl EnemDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

fn column(ui: &mut Ui, width: f32, add_contents: impl FnOnce(&mut Ui)) {
    ui.vertical(|ui: &mut Ui| {
        ui.set_width(width);
        add_contents(ui);
    });
}

impl eframe::App for EnemDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and state table ----
        egui::SidePanel::left("filter_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Dashboard ENEM - Interativo");
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    let spacing = ui.spacing().item_spacing.x * 2.0;
                    let total: f32 = COLUMN_WEIGHTS.iter().sum();
                    let available = (ui.available_width() - spacing).max(300.0);
                    let [left, centre, right] =
                        COLUMN_WEIGHTS.map(|w| available * w / total);

                    let state = &mut self.state;
                    ui.horizontal_top(|ui: &mut Ui| {
                        column(ui, left, |ui| {
                            charts::donut(
                                ui,
                                "Presença no ENEM",
                                ("Presente", "Ausente"),
                                &state.views.presence,
                                color::PRESENCE,
                            );
                            ui.add_space(12.0);
                            charts::donut(
                                ui,
                                "Concluiu Ensino Médio",
                                ("Concluiu", "Não concluiu"),
                                &state.views.completion,
                                color::COMPLETION,
                            );
                        });
                        column(ui, centre, |ui| {
                            map::participation_map(ui, state);
                            ui.add_space(12.0);
                            charts::income_heatmap(ui, &state.views.income_scores);
                        });
                        column(ui, right, |ui| {
                            charts::internet_by_year(ui, &state.views.internet_by_year);
                            ui.add_space(12.0);
                            charts::mean_by_year(ui, &state.views.mean_by_year);
                        });
                    });
                });
        });
    }
}
