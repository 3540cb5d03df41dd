//! Perspective rectification of the located sheet onto a fixed canvas.

use image::RgbImage;
use nalgebra::Point2;
use paperscale_core::{homography_from_4pt, to_gray, warp_perspective_rgb, Homography};

use crate::error::SheetDetectError;
use crate::locator::{locate_sheet, SheetQuad};
use crate::params::SheetParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fronto-parallel view of the sheet plus the scale it implies.
#[derive(Clone, Debug)]
pub struct RectifiedSheet {
    pub canvas: RgbImage,
    /// Millimetres per canvas pixel (`short_mm / canvas_width`).
    pub scale_mm_per_px: f64,
    /// Maps source-photo pixels to canvas pixels.
    pub transform: Homography,
    pub quad: SheetQuad,
}

impl RectifiedSheet {
    /// Map a point clicked on the original photo into canvas pixels.
    pub fn map_to_canvas(&self, p: Point2<f64>) -> Point2<f64> {
        self.transform.apply(p)
    }
}

/// Source corners in the order they are sent to canvas
/// `(0,0), (W-1,0), (W-1,H-1), (0,H-1)`.
///
/// With `long_side_vertical`, a quad whose top/bottom edges are longer than
/// its sides is rotated a quarter turn so the long edges land on the canvas
/// height.
fn source_order(corners: &[Point2<f64>; 4], long_side_vertical: bool) -> [Point2<f64>; 4] {
    let [tl, tr, br, bl] = *corners;
    if !long_side_vertical {
        return [tl, tr, br, bl];
    }
    let horizontal = 0.5 * ((tr - tl).norm() + (br - bl).norm());
    let vertical = 0.5 * ((bl - tl).norm() + (br - tr).norm());
    if horizontal > vertical {
        [bl, tl, tr, br]
    } else {
        [tl, tr, br, bl]
    }
}

/// Warp `image` so the located quad fills a `canvas_size()` canvas.
pub fn rectify(
    image: &RgbImage,
    quad: SheetQuad,
    params: &SheetParams,
) -> Result<RectifiedSheet, SheetDetectError> {
    let (w, h) = params.canvas_size();
    if w < 2 || h < 2 {
        return Err(SheetDetectError::InvalidImage { width: w, height: h });
    }
    let (wf, hf) = ((w - 1) as f64, (h - 1) as f64);
    let dst = [
        Point2::new(0.0, 0.0),
        Point2::new(wf, 0.0),
        Point2::new(wf, hf),
        Point2::new(0.0, hf),
    ];
    let src = source_order(&quad.corners, params.long_side_vertical);

    let canvas_from_src = homography_from_4pt(&src, &dst).ok_or(SheetDetectError::HomographyFailed)?;
    let src_from_canvas = canvas_from_src
        .inverse()
        .ok_or(SheetDetectError::HomographyFailed)?;

    let canvas = warp_perspective_rgb(image, &src_from_canvas, w, h);
    Ok(RectifiedSheet {
        canvas,
        scale_mm_per_px: params.scale_mm_per_px(),
        transform: canvas_from_src,
        quad,
    })
}

/// Locate and rectify the reference sheet in a color photo.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, params), fields(width = image.width(), height = image.height()))
)]
pub fn detect_sheet(image: &RgbImage, params: &SheetParams) -> Result<RectifiedSheet, SheetDetectError> {
    let quad = locate_sheet(&to_gray(image), params)?;
    rectify(image, quad, params)
}
