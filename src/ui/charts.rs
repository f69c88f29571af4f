use std::collections::BTreeSet;
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{
    pos2, vec2, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Shape, Stroke, Ui,
};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use enem_dashboard::data::model::{IncomeBracket, InternetAccess};
use enem_dashboard::data::views::{
    IncomeScoreMatrix, InternetYearShare, RateSummary, YearMean,
};

use crate::color::{self, ColorScale};

/// Integer ticks only; years must not read "2018.5".
fn year_axis(mark: egui_plot::GridMark, _range: &std::ops::RangeInclusive<f64>) -> String {
    if mark.value.fract().abs() < 1e-9 {
        format!("{:.0}", mark.value)
    } else {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// Donut
// ---------------------------------------------------------------------------

/// Ring filled to `rate.percentage()` with the figure in the middle.
pub fn donut(ui: &mut Ui, title: &str, labels: (&str, &str), rate: &RateSummary, fill: Color32) {
    ui.label(RichText::new(title).strong());

    let size = ui.available_width().clamp(120.0, 240.0);
    let (rect, response) = ui.allocate_exact_size(vec2(size, size), Sense::hover());
    let painter = ui.painter_at(rect);
    let center = rect.center();
    let thickness = size * 0.08;
    let radius = size * 0.5 - thickness;

    painter.circle_stroke(
        center,
        radius,
        Stroke::new(thickness, ui.visuals().faint_bg_color),
    );

    let fraction = (rate.percentage() / 100.0) as f32;
    if fraction > 0.0 {
        let steps = ((fraction * 128.0).ceil() as usize).max(2);
        let points: Vec<Pos2> = (0..=steps)
            .map(|i| {
                let angle = -FRAC_PI_2 + TAU * fraction * i as f32 / steps as f32;
                center + radius * vec2(angle.cos(), angle.sin())
            })
            .collect();
        painter.add(Shape::line(points, Stroke::new(thickness, fill)));
    }

    let text = if rate.total() == 0 {
        "sem dados".to_string()
    } else {
        rate.percentage_label()
    };
    painter.text(
        center,
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(size * 0.15),
        fill,
    );

    response.on_hover_text(format!(
        "{}: {}\n{}: {}",
        labels.0, rate.positive, labels.1, rate.negative
    ));
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Short column tag; the full label is in the hover text.
fn bracket_tag(bracket: &IncomeBracket) -> String {
    match bracket {
        IncomeBracket::Known(idx) => format!("{}", idx + 1),
        IncomeBracket::Other(_) => "?".to_string(),
    }
}

/// Mean score per year (rows) and income bracket (columns).
pub fn income_heatmap(ui: &mut Ui, matrix: &IncomeScoreMatrix) {
    ui.label(RichText::new("Média por Renda").strong());

    let Some((lo, hi)) = matrix.value_range() else {
        ui.label("Nenhum participante presente com nota na seleção.");
        return;
    };
    let scale = ColorScale::new(lo, hi);

    let label_width = 44.0;
    let axis_height = 16.0;
    let cell_h = 28.0;
    let width = ui.available_width();
    let cell_w = ((width - label_width) / matrix.brackets.len() as f32).max(4.0);
    let height = cell_h * matrix.years.len() as f32 + axis_height;

    let (rect, response) = ui.allocate_exact_size(vec2(width, height), Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let grid_left = rect.left() + label_width;

    for (row, year) in matrix.years.iter().enumerate() {
        let top = rect.top() + row as f32 * cell_h;
        painter.text(
            pos2(grid_left - 6.0, top + cell_h / 2.0),
            Align2::RIGHT_CENTER,
            year.to_string(),
            FontId::proportional(12.0),
            text_color,
        );
        for (col, mean) in matrix.means[row].iter().enumerate() {
            let cell = Rect::from_min_size(
                pos2(grid_left + col as f32 * cell_w, top),
                vec2(cell_w, cell_h),
            )
            .shrink(0.5);
            let fill = mean.map_or(color::NO_DATA, |m| scale.color_for(m));
            painter.rect_filled(cell, 0.0, fill);
        }
    }

    let axis_y = rect.top() + cell_h * matrix.years.len() as f32 + axis_height / 2.0;
    for (col, bracket) in matrix.brackets.iter().enumerate() {
        painter.text(
            pos2(grid_left + (col as f32 + 0.5) * cell_w, axis_y),
            Align2::CENTER_CENTER,
            bracket_tag(bracket),
            FontId::proportional(10.0),
            text_color,
        );
    }

    let hovered = response.hover_pos().and_then(|pos| {
        let col = ((pos.x - grid_left) / cell_w).floor();
        let row = ((pos.y - rect.top()) / cell_h).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        let year = matrix.years.get(row)?;
        let bracket = matrix.brackets.get(col)?;
        Some((*year, bracket, matrix.means[row][col], matrix.counts[row][col]))
    });

    if let Some((year, bracket, mean, count)) = hovered {
        response.on_hover_ui_at_pointer(|ui| {
            ui.label(format!("Ano: {year}"));
            ui.label(format!("Renda: {bracket}"));
            match mean {
                Some(m) => ui.label(format!("Média de Notas: {m:.2}")),
                None => ui.label("Média de Notas: —"),
            };
            ui.label(format!("Participantes: {count}"));
        });
    }

    ui.horizontal(|ui| {
        ui.small("Média de Notas:");
        for (value, swatch) in scale.legend_entries(5) {
            let (r, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
            ui.painter().rect_filled(r, 2.0, swatch);
            ui.small(format!("{value:.0}"));
        }
    });
}

// ---------------------------------------------------------------------------
// Stacked bars
// ---------------------------------------------------------------------------

fn access_color(access: &InternetAccess) -> Color32 {
    match access {
        InternetAccess::Yes => color::INTERNET_YES,
        InternetAccess::No => color::INTERNET_NO,
        InternetAccess::Other(_) => Color32::GRAY,
    }
}

/// Participants per year, stacked by internet answer, labelled with the
/// share within the year.
pub fn internet_by_year(ui: &mut Ui, shares: &[InternetYearShare]) {
    ui.label(RichText::new("Acesso à Internet por Ano").strong());
    if shares.is_empty() {
        ui.label("Sem respostas na seleção.");
        return;
    }

    let years: Vec<i32> = shares
        .iter()
        .map(|s| s.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let answers: BTreeSet<&InternetAccess> = shares.iter().map(|s| &s.access).collect();

    // stack_on pairs bars by position, so every chart gets one bar per year.
    let mut charts: Vec<BarChart> = Vec::new();
    let mut labels: Vec<Text> = Vec::new();
    let mut bases = vec![0.0_f64; years.len()];

    for access in answers {
        let mut bars = Vec::with_capacity(years.len());
        for (i, year) in years.iter().enumerate() {
            let share = shares
                .iter()
                .find(|s| s.year == *year && &s.access == access);
            let total = share.map_or(0.0, |s| s.total as f64);
            bars.push(
                Bar::new(*year as f64, total)
                    .width(0.6)
                    .name(format!("{year} · {access}")),
            );
            if let Some(share) = share {
                labels.push(Text::new(
                    PlotPoint::new(*year as f64, bases[i] + total / 2.0),
                    RichText::new(share.percentage_label()).color(Color32::BLACK),
                ));
            }
            bases[i] += total;
        }

        let previous: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(access.to_string())
            .color(access_color(access))
            .stack_on(&previous);
        charts.push(chart);
    }

    Plot::new("internet_by_year")
        .height(300.0)
        .legend(Legend::default())
        .x_axis_label("Ano")
        .y_axis_label("Participantes")
        .x_axis_formatter(year_axis)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
            for label in labels {
                plot_ui.text(label);
            }
        });
}

// ---------------------------------------------------------------------------
// Line chart
// ---------------------------------------------------------------------------

/// Overall mean score per year. Years without any score are skipped.
pub fn mean_by_year(ui: &mut Ui, means: &[YearMean]) {
    ui.label(RichText::new("Média Geral das Notas por Ano").strong());

    let points: Vec<[f64; 2]> = means
        .iter()
        .filter_map(|m| m.mean.map(|mean| [m.year as f64, mean]))
        .collect();
    if points.is_empty() {
        ui.label("Sem notas na seleção.");
        return;
    }

    Plot::new("mean_by_year")
        .height(240.0)
        .x_axis_label("Ano")
        .y_axis_label("Média das Notas")
        .x_axis_formatter(year_axis)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .color(color::MEAN_LINE)
                    .width(3.0)
                    .name("Média das Notas"),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(color::MEAN_LINE)
                    .radius(4.0),
            );
        });
}
