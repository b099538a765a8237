// src/services/colormap.rs
// DOCUMENTATION: Similarity color palettes
// PURPOSE: Map a normalized similarity to a translucent CSS color per lens

use crate::models::Lens;
use serde::Serialize;

/// Opacity applied to every grid fill
const FILL_ALPHA: f64 = 0.5;

/// Available palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    CividisR,
    SummerR,
    Plasma,
    Seismic,
    Viridis,
}

impl Colormap {
    /// Palette for a lens
    pub fn for_lens(lens: Lens) -> Colormap {
        match lens {
            Lens::Water => Colormap::CividisR,
            Lens::Vegetation => Colormap::SummerR,
            Lens::Topography => Colormap::Plasma,
            Lens::Roads => Colormap::Seismic,
        }
    }

    /// Palette for a lens selection: a single lens keeps its own palette,
    /// mixed selections share viridis
    pub fn for_selection(lenses: &[Lens]) -> Colormap {
        match lenses {
            [lens] => Self::for_lens(*lens),
            _ => Colormap::Viridis,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Colormap::CividisR => "cividis_r",
            Colormap::SummerR => "summer_r",
            Colormap::Plasma => "plasma",
            Colormap::Seismic => "seismic",
            Colormap::Viridis => "viridis",
        }
    }

    /// Map a value in [0, 1] to 8-bit RGB; out-of-range values are clamped
    pub fn rgb(&self, value: f64) -> (u8, u8, u8) {
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

        match self {
            Colormap::CividisR => (
                channel(1.0 - v * 0.7),
                channel(1.0 - v * 0.3),
                channel(0.4 + v * 0.6),
            ),
            Colormap::SummerR => summer_r(v),
            Colormap::Plasma => (
                channel(0.2 + v * 0.8),
                channel(v * 0.7),
                channel(0.8 - v * 0.3),
            ),
            Colormap::Seismic => {
                if v < 0.5 {
                    (channel(1.0 - 2.0 * v), channel(1.0 - 2.0 * v), 255)
                } else {
                    (255, channel(2.0 - 2.0 * v), channel(2.0 - 2.0 * v))
                }
            }
            Colormap::Viridis => viridis(v),
        }
    }

    /// CSS fill string with the grid opacity
    pub fn fill(&self, value: f64) -> String {
        let (r, g, b) = self.rgb(value);
        format!("rgba({}, {}, {}, {})", r, g, b, FILL_ALPHA)
    }
}

fn channel(fraction: f64) -> u8 {
    (255.0 * fraction).round().clamp(0.0, 255.0) as u8
}

/// Orange -> yellow -> green -> dark green
fn summer_r(v: f64) -> (u8, u8, u8) {
    if v <= 0.5 {
        let t = v / 0.5;
        (255, (165.0 + t * 90.0).round() as u8, 0)
    } else if v <= 0.75 {
        let t = (v - 0.5) / 0.25;
        (channel(1.0 - t), 255, 0)
    } else {
        let t = (v - 0.75) / 0.25;
        (0, (255.0 - t * 155.0).round() as u8, 0)
    }
}

/// Five-point viridis approximation
fn viridis(v: f64) -> (u8, u8, u8) {
    const POINTS: [(f64, f64, f64); 5] = [
        (0.267004, 0.004874, 0.329415),
        (0.282623, 0.140926, 0.457517),
        (0.163625, 0.471133, 0.558148),
        (0.477504, 0.821444, 0.318195),
        (0.993248, 0.906157, 0.143936),
    ];

    let idx = v * (POINTS.len() - 1) as f64;
    let i = (idx.floor() as usize).min(POINTS.len() - 2);
    let t = idx - i as f64;

    let (r0, g0, b0) = POINTS[i];
    let (r1, g1, b1) = POINTS[i + 1];

    (
        channel(r0 + t * (r1 - r0)),
        channel(g0 + t * (g1 - g0)),
        channel(b0 + t * (b1 - b0)),
    )
}
