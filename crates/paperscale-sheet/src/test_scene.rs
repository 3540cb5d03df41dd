//! Synthetic photos of a bright sheet on a dark table.

use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::Point2;

/// Mildly perspective-distorted portrait A4 inside a 640 x 560 frame.
pub fn a4_portrait() -> [Point2<f64>; 4] {
    [
        Point2::new(180.0, 80.0),
        Point2::new(460.0, 95.0),
        Point2::new(475.0, 490.0),
        Point2::new(160.0, 470.0),
    ]
}

fn inside(quad: &[Point2<f64>; 4], x: f64, y: f64) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
        if c == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}

/// Render `quad` as paper (4x4 supersampled) with an optional left-to-right
/// lighting falloff. Pixel `(x, y)` covers `[x - 0.5, x + 0.5]`.
pub fn render_quad_scene(w: u32, h: u32, quad: &[Point2<f64>; 4], gradient: bool) -> (RgbImage, GrayImage) {
    let gray = GrayImage::from_fn(w, h, |x, y| {
        let mut hits = 0;
        for sy in 0..4 {
            for sx in 0..4 {
                let px = x as f64 - 0.5 + (sx as f64 + 0.5) / 4.0;
                let py = y as f64 - 0.5 + (sy as f64 + 0.5) / 4.0;
                if inside(quad, px, py) {
                    hits += 1;
                }
            }
        }
        let cover = hits as f64 / 16.0;
        let light = if gradient { 0.7 + 0.3 * x as f64 / w as f64 } else { 1.0 };
        let v = (45.0 * (1.0 - cover) + 235.0 * cover) * light;
        Luma([v.round() as u8])
    });
    let rgb = RgbImage::from_fn(w, h, |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    (rgb, gray)
}
