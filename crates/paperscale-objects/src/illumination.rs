use image::GrayImage;
use paperscale_core::filters::{clahe, divide_by_background};

use crate::params::IlluminationParams;

/// Remove slow shading and shadows from a grayscale canvas.
///
/// The image is divided by a large-kernel blur of itself (a flat-field
/// estimate), rescaled to the full range, and then locally equalized with
/// CLAHE so faint edges in formerly shadowed areas survive edge detection.
pub fn normalize_illumination(gray: &GrayImage, params: &IlluminationParams) -> GrayImage {
    let flat = divide_by_background(gray, params.background_kernel);
    clahe(&flat, params.clahe_clip, params.clahe_tiles)
}
