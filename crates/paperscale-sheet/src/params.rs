use paperscale_core::{Strategy, SubPixParams};
use serde::{Deserialize, Serialize};

/// Physical size of the reference sheet in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetSize {
    pub short_mm: f64,
    pub long_mm: f64,
}

impl SheetSize {
    /// ISO 216 A4, 210 x 297 mm.
    pub const fn a4() -> Self {
        Self {
            short_mm: 210.0,
            long_mm: 297.0,
        }
    }

    /// US Letter, 8.5 x 11 in.
    pub const fn letter() -> Self {
        Self {
            short_mm: 215.9,
            long_mm: 279.4,
        }
    }

    /// Long over short side.
    pub fn aspect_ratio(&self) -> f64 {
        self.long_mm / self.short_mm
    }
}

impl Default for SheetSize {
    fn default() -> Self {
        Self::a4()
    }
}

/// Sheet cascade: three Gaussian/Canny smoothing levels, bilateral Canny,
/// adaptive threshold, then global Otsu as the last resort.
pub fn default_sheet_strategies() -> Vec<Strategy> {
    vec![
        Strategy::canny(5, 50.0, 150.0),
        Strategy::canny(11, 30.0, 100.0),
        Strategy::canny(21, 20.0, 80.0),
        Strategy::bilateral_canny(40.0, 120.0),
        Strategy::AdaptiveThreshold {
            blur_kernel: 7,
            block_size: 15,
            c: 4.0,
        },
        Strategy::Otsu { blur_kernel: 5 },
    ]
}

/// Parameters of the reference-sheet locator and rectifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetParams {
    pub sheet: SheetSize,
    /// Width of the rectified canvas in pixels; the height follows the
    /// sheet aspect ratio.
    pub canvas_width: u32,
    /// Candidate contours must cover at least this fraction of the image.
    pub min_area_frac: f64,
    /// Contours above this fraction are treated as frame-border artifacts.
    pub max_area_frac: f64,
    /// Largest contours inspected per strategy.
    pub max_candidates: usize,
    /// Douglas-Peucker tolerances, as fractions of the contour perimeter,
    /// tried in order until a quadrilateral appears.
    pub approx_eps_fracs: Vec<f64>,
    /// Accepted relative deviation from the sheet aspect ratio.
    pub aspect_tolerance: f64,
    /// 3x3 closing passes applied to each strategy mask.
    pub close_iterations: u8,
    pub corner_refine: SubPixParams,
    /// Map the longer side of the located quad onto the canvas height, so a
    /// sheet lying in landscape is not squashed into the portrait canvas.
    pub long_side_vertical: bool,
    pub strategies: Vec<Strategy>,
}

impl Default for SheetParams {
    fn default() -> Self {
        Self {
            sheet: SheetSize::a4(),
            canvas_width: 800,
            min_area_frac: 0.08,
            max_area_frac: 0.97,
            max_candidates: 10,
            approx_eps_fracs: vec![0.02, 0.03, 0.04, 0.05],
            aspect_tolerance: 0.30,
            close_iterations: 2,
            corner_refine: SubPixParams::default(),
            long_side_vertical: true,
            strategies: default_sheet_strategies(),
        }
    }
}

impl SheetParams {
    /// Canvas `(width, height)` in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let w = self.canvas_width;
        let h = (w as f64 * self.sheet.aspect_ratio()).round() as u32;
        (w, h)
    }

    /// Millimetres per canvas pixel.
    pub fn scale_mm_per_px(&self) -> f64 {
        self.sheet.short_mm / self.canvas_width as f64
    }

    /// Accepted `[min, max]` long/short ratio of a located quad.
    pub fn aspect_bounds(&self) -> (f64, f64) {
        let target = self.sheet.aspect_ratio();
        (
            target * (1.0 - self.aspect_tolerance),
            target * (1.0 + self.aspect_tolerance),
        )
    }
}
