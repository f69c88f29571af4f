use std::fmt::Display;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and the state table
// ---------------------------------------------------------------------------

/// What a multiselect asks the state to do after drawing.
enum Selection<T> {
    Toggle(T),
    All,
    Clear,
}

/// Collapsible checkbox list. Returns at most one requested change.
fn multiselect<T: Clone + Display>(
    ui: &mut Ui,
    title: &str,
    values: &[T],
    is_selected: impl Fn(&T) -> bool,
) -> Option<Selection<T>> {
    let n_selected = values.iter().filter(|&v| is_selected(v)).count();
    let header_text = format!("{title}  ({n_selected}/{})", values.len());
    let mut change = None;

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Todos").clicked() {
                    change = Some(Selection::All);
                }
                if ui.small_button("Nenhum").clicked() {
                    change = Some(Selection::Clear);
                }
            });
            for val in values {
                let mut checked = is_selected(val);
                if ui.checkbox(&mut checked, val.to_string()).changed() {
                    change = Some(Selection::Toggle(val.clone()));
                }
            }
        });

    change
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filtros");
    ui.separator();

    // Clone what we need so we can mutate state afterwards.
    let years = state.table.years.clone();
    let sexes: Vec<_> = state.table.sexes.iter().cloned().collect();
    let races: Vec<_> = state.table.races.iter().cloned().collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match multiselect(ui, "Ano", &years, |y| state.selection.years.contains(y)) {
                Some(Selection::Toggle(year)) => state.toggle_year(year),
                Some(Selection::All) => state.select_all_years(),
                Some(Selection::Clear) => state.select_no_years(),
                None => {}
            }
            match multiselect(ui, "Sexo", &sexes, |s| state.selection.sexes.contains(s)) {
                Some(Selection::Toggle(sex)) => state.toggle_sex(&sex),
                Some(Selection::All) => state.select_all_sexes(),
                Some(Selection::Clear) => state.select_no_sexes(),
                None => {}
            }
            match multiselect(ui, "Cor/Raça", &races, |r| state.selection.races.contains(r)) {
                Some(Selection::Toggle(race)) => state.toggle_race(&race),
                Some(Selection::All) => state.select_all_races(),
                Some(Selection::Clear) => state.select_no_races(),
                None => {}
            }

            ui.separator();
            ui.strong("Porcentagem de participantes com acesso à internet por estado");
            state_table(ui, state);
        });
}

fn state_table(ui: &mut Ui, state: &AppState) {
    let rows = &state.views.state_summary;
    if rows.is_empty() {
        ui.label("Nenhum participante na seleção.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Estado");
            });
            header.col(|ui| {
                ui.strong("Participantes");
            });
            header.col(|ui| {
                ui.strong("Com internet");
            });
            header.col(|ui| {
                ui.strong("%");
            });
        })
        .body(|mut body| {
            for row in rows {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&row.state_code);
                    });
                    table_row.col(|ui| {
                        ui.label(row.total.to_string());
                    });
                    table_row.col(|ui| {
                        ui.label(row.with_internet.to_string());
                    });
                    table_row.col(|ui| {
                        ui.label(row.percentage_label());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Abrir pasta de dados…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} registros carregados, {} na seleção",
            state.table.len(),
            state.views.filtered_rows
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Pasta com os arquivos enem_<ano>.parquet")
        .set_directory(&state.config.data_dir)
        .pick_folder();

    if let Some(path) = folder {
        state.reload_from(path);
    }
}
