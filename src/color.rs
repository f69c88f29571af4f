use eframe::egui::Color32;
use palette::{IntoColor, Lab, Mix, Srgb};

// ---------------------------------------------------------------------------
// Sequential colour scale
// ---------------------------------------------------------------------------

/// ColorBrewer YlOrRd, light to dark.
const YL_OR_RD: [(u8, u8, u8); 5] = [
    (0xff, 0xff, 0xb2),
    (0xfe, 0xcc, 0x5c),
    (0xfd, 0x8d, 0x3c),
    (0xf0, 0x3b, 0x20),
    (0xbd, 0x00, 0x26),
];

pub const INTERNET_YES: Color32 = Color32::from_rgb(0xfe, 0xb2, 0x4c);
pub const INTERNET_NO: Color32 = Color32::from_rgb(0xf0, 0x3b, 0x20);
pub const PRESENCE: Color32 = Color32::LIGHT_GREEN;
pub const COMPLETION: Color32 = Color32::LIGHT_BLUE;
pub const MEAN_LINE: Color32 = Color32::from_rgb(0x41, 0x69, 0xe1);
pub const NO_DATA: Color32 = Color32::from_gray(90);

fn lab(stop: (u8, u8, u8)) -> Lab {
    let rgb: Srgb = Srgb::new(stop.0, stop.1, stop.2).into_format();
    rgb.into_color()
}

/// Colour at `t ∈ [0, 1]` on the YlOrRd scale, interpolated in Lab.
pub fn sequential(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 } as f32;
    let segments = (YL_OR_RD.len() - 1) as f32;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(YL_OR_RD.len() - 2);
    let local = pos - idx as f32;

    let mixed = lab(YL_OR_RD[idx]).mix(lab(YL_OR_RD[idx + 1]), local);
    let rgb: Srgb = mixed.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Maps values in `[min, max]` onto the sequential scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return sequential(1.0);
        }
        sequential((value - self.min) / span)
    }

    /// Evenly spaced legend swatches from `min` to `max`.
    pub fn legend_entries(&self, steps: usize) -> Vec<(f64, Color32)> {
        let steps = steps.max(2);
        (0..steps)
            .map(|i| {
                let value = self.min + (self.max - self.min) * i as f64 / (steps - 1) as f64;
                (value, self.color_for(value))
            })
            .collect()
    }
}
