use image::RgbImage;
use nalgebra::Point2;
use paperscale_core::Homography;
use paperscale_sheet::RectifiedSheet;

/// Scale, rectified canvas and transform from one successful sheet
/// detection. Later measurements in the same session reuse it.
#[derive(Clone, Debug)]
pub struct CalibrationRecord {
    /// Millimetres per canvas pixel.
    pub scale_mm_per_px: f64,
    pub canvas: RgbImage,
    /// Source-photo pixels to canvas pixels.
    pub transform: Homography,
}

impl CalibrationRecord {
    pub fn map_to_canvas(&self, p: Point2<f64>) -> Point2<f64> {
        self.transform.apply(p)
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }
}

impl From<RectifiedSheet> for CalibrationRecord {
    fn from(sheet: RectifiedSheet) -> Self {
        Self {
            scale_mm_per_px: sheet.scale_mm_per_px,
            canvas: sheet.canvas,
            transform: sheet.transform,
        }
    }
}
