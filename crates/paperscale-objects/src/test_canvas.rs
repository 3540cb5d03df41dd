//! Synthetic rectified canvases: dark objects on white paper.

use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::Point2;
use paperscale_core::{external_contours, Contour};

const PAPER: f64 = 225.0;
const INK: f64 = 50.0;

pub struct Canvas {
    ink: Vec<f64>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn paper(width: u32, height: u32) -> Self {
        Self {
            ink: vec![0.0; (width * height) as usize],
            width,
            height,
        }
    }

    /// Paint a shape given as an inside test, 4x4 supersampled. Pixel
    /// `(x, y)` covers `[x - 0.5, x + 0.5]`.
    fn paint(&mut self, bbox: (f64, f64, f64, f64), inside: impl Fn(f64, f64) -> bool) {
        let (x0, y0, x1, y1) = bbox;
        let xs = (x0.floor().max(0.0) as u32)..((x1.ceil() + 1.0).min(self.width as f64) as u32);
        let ys = (y0.floor().max(0.0) as u32)..((y1.ceil() + 1.0).min(self.height as f64) as u32);
        for y in ys {
            for x in xs.clone() {
                let mut hits = 0;
                for sy in 0..4 {
                    for sx in 0..4 {
                        let px = x as f64 - 0.5 + (sx as f64 + 0.5) / 4.0;
                        let py = y as f64 - 0.5 + (sy as f64 + 0.5) / 4.0;
                        if inside(px, py) {
                            hits += 1;
                        }
                    }
                }
                let i = (y * self.width + x) as usize;
                self.ink[i] = self.ink[i].max(hits as f64 / 16.0);
            }
        }
    }

    pub fn disc(&mut self, cx: f64, cy: f64, r: f64) -> &mut Self {
        self.paint((cx - r, cy - r, cx + r, cy + r), |x, y| {
            (x - cx).powi(2) + (y - cy).powi(2) <= r * r
        });
        self
    }

    pub fn ellipse(&mut self, cx: f64, cy: f64, a: f64, b: f64, angle_deg: f64) -> &mut Self {
        let (s, c) = angle_deg.to_radians().sin_cos();
        self.paint((cx - a, cy - a, cx + a, cy + a), |x, y| {
            let u = (x - cx) * c + (y - cy) * s;
            let v = -(x - cx) * s + (y - cy) * c;
            (u / a).powi(2) + (v / b).powi(2) <= 1.0
        });
        self
    }

    /// Rectangle centred at `(cx, cy)` with side `w` along `angle_deg`.
    pub fn rect(&mut self, cx: f64, cy: f64, w: f64, h: f64, angle_deg: f64) -> &mut Self {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let reach = 0.5 * (w * w + h * h).sqrt();
        self.paint((cx - reach, cy - reach, cx + reach, cy + reach), |x, y| {
            let u = (x - cx) * c + (y - cy) * s;
            let v = -(x - cx) * s + (y - cy) * c;
            u.abs() <= 0.5 * w && v.abs() <= 0.5 * h
        });
        self
    }

    pub fn gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let k = self.ink[(y * self.width + x) as usize];
            Luma([(PAPER * (1.0 - k) + INK * k).round() as u8])
        })
    }

    pub fn rgb(&self) -> RgbImage {
        let g = self.gray();
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let v = g.get_pixel(x, y)[0];
            Rgb([v, v, v])
        })
    }
}

/// Largest outer contour of the region where `inside(x, y)` holds on a
/// 400 x 566 grid.
pub fn mask_contour(inside: impl Fn(u32, u32) -> bool) -> Contour {
    let mask = GrayImage::from_fn(400, 566, |x, y| Luma([if inside(x, y) { 255 } else { 0 }]));
    external_contours(&mask)
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .unwrap_or_default()
}

/// Axis-aligned square outline with `side` pixels per edge.
pub fn square(cx: f64, cy: f64, side: f64) -> Contour {
    let h = 0.5 * side;
    Contour::new(vec![
        Point2::new(cx - h, cy - h),
        Point2::new(cx + h, cy - h),
        Point2::new(cx + h, cy + h),
        Point2::new(cx - h, cy + h),
    ])
}
