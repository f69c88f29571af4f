use eframe::egui::{pos2, vec2, Color32, Mesh, Pos2, Rect, RichText, Sense, Shape, Stroke, Ui};

use enem_dashboard::geo::{join_participation, StateBoundaries};

use crate::color::{self, ColorScale};
use crate::state::{AppState, MapLayer};

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Equirectangular fit of a lon/lat box into a screen rect, with longitude
/// shrunk by the cosine of the mid latitude.
struct Projection {
    min_lon: f64,
    max_lat: f64,
    kx: f64,
    scale: f64,
    origin: Pos2,
}

impl Projection {
    fn fit(([min_lon, min_lat], [max_lon, max_lat]): ([f64; 2], [f64; 2]), rect: Rect) -> Self {
        let kx = ((min_lat + max_lat) / 2.0).to_radians().cos().abs().max(0.1);
        let geo_w = ((max_lon - min_lon) * kx).max(1e-9);
        let geo_h = (max_lat - min_lat).max(1e-9);
        let scale = (rect.width() as f64 / geo_w).min(rect.height() as f64 / geo_h);
        let used = vec2((geo_w * scale) as f32, (geo_h * scale) as f32);
        Self {
            min_lon,
            max_lat,
            kx,
            scale,
            origin: rect.center() - used / 2.0,
        }
    }

    fn to_screen(&self, [lon, lat]: [f64; 2]) -> Pos2 {
        pos2(
            self.origin.x + ((lon - self.min_lon) * self.kx * self.scale) as f32,
            self.origin.y + ((self.max_lat - lat) * self.scale) as f32,
        )
    }

    fn to_geo(&self, pos: Pos2) -> [f64; 2] {
        [
            self.min_lon + (pos.x - self.origin.x) as f64 / (self.scale * self.kx),
            self.max_lat - (pos.y - self.origin.y) as f64 / self.scale,
        ]
    }
}

// ---------------------------------------------------------------------------
// Choropleth
// ---------------------------------------------------------------------------

/// Participants per state. If the boundaries are unavailable only this
/// panel degrades.
pub fn participation_map(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("Total de Candidatos por Estado").strong());

    if let MapLayer::Unavailable(reason) = &state.map {
        let reason = reason.clone();
        ui.label(RichText::new(format!("Mapa indisponível: {reason}")).color(Color32::RED));
        if ui.button("Tentar novamente").clicked() {
            state.retry_map();
        }
        return;
    }
    let MapLayer::Ready(boundaries) = &state.map else {
        return;
    };
    draw_choropleth(ui, boundaries, state);
}

fn draw_choropleth(ui: &mut Ui, boundaries: &StateBoundaries, state: &AppState) {
    let Some(bounds) = boundaries.bounds() else {
        ui.label("Documento de contornos vazio.");
        return;
    };
    let join = join_participation(boundaries, &state.views.participation);
    let scale = ColorScale::new(0.0, join.max_value() as f64);

    let size = vec2(ui.available_width(), 300.0);
    let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
    let projection = Projection::fit(bounds, rect);
    let painter = ui.painter_at(rect);
    let outline = Stroke::new(0.6, Color32::from_gray(40));

    for (shape, (_, count)) in boundaries.shapes.iter().zip(&join.values) {
        let fill = if *count == 0 {
            color::NO_DATA
        } else {
            scale.color_for(*count as f64)
        };
        for (ring, triangles) in shape.rings.iter().zip(&shape.triangles) {
            let mut mesh = Mesh::default();
            for point in ring {
                mesh.colored_vertex(projection.to_screen(*point), fill);
            }
            for [a, b, c] in triangles {
                mesh.add_triangle(*a as u32, *b as u32, *c as u32);
            }
            painter.add(Shape::mesh(mesh));

            let points: Vec<Pos2> = ring.iter().map(|p| projection.to_screen(*p)).collect();
            painter.add(Shape::closed_line(points, outline));
        }
    }

    let hovered = response.hover_pos().and_then(|pos| {
        let shape = boundaries.shape_at(projection.to_geo(pos))?;
        let count = join
            .values
            .iter()
            .find(|(name, _)| *name == shape.name)
            .map_or(0, |(_, count)| *count);
        Some(format!("{}: {count}", shape.name))
    });
    if let Some(text) = hovered {
        response.on_hover_text_at_pointer(text);
    }

    ui.horizontal(|ui| {
        ui.small("Quantidade:");
        for (value, swatch) in scale.legend_entries(5) {
            let (r, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
            ui.painter().rect_filled(r, 2.0, swatch);
            ui.small(format!("{value:.0}"));
        }
    });
    if !join.unmatched.is_empty() {
        ui.small(format!("Sem contorno no mapa: {}", join.unmatched.join(", ")));
    }
}
