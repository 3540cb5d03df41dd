//! Synthetic photos: an A4 sheet under perspective on a dark table, with
//! dark objects lying on it. Object geometry is given in sheet millimetres.

#![allow(dead_code)]

use image::{Rgb, RgbImage};
use nalgebra::Point2;
use paperscale::core::{homography_from_4pt, Homography};

pub const SHEET_MM: (f64, f64) = (210.0, 297.0);

#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Disc { cx: f64, cy: f64, r: f64 },
    Card { cx: f64, cy: f64, w: f64, h: f64, angle_deg: f64 },
}

impl Shape {
    fn contains(&self, x: f64, y: f64) -> bool {
        match *self {
            Shape::Disc { cx, cy, r } => (x - cx).powi(2) + (y - cy).powi(2) <= r * r,
            Shape::Card { cx, cy, w, h, angle_deg } => {
                let (s, c) = angle_deg.to_radians().sin_cos();
                let u = (x - cx) * c + (y - cy) * s;
                let v = -(x - cx) * s + (y - cy) * c;
                u.abs() <= 0.5 * w && v.abs() <= 0.5 * h
            }
        }
    }
}

pub struct Scene {
    pub width: u32,
    pub height: u32,
    /// Sheet corners in the photo: top-left, top-right, bottom-right,
    /// bottom-left of the portrait sheet.
    pub corners: [Point2<f64>; 4],
    pub shapes: Vec<Shape>,
    /// Light falls off from right to left.
    pub gradient: bool,
}

/// Portrait sheet centred in a `width x height` photo at `px_per_mm`,
/// rotated by `angle_deg` and with the top edge narrowed by `keystone`
/// (0.1 = 10%) to mimic a tilted camera.
pub fn sheet_corners(width: u32, height: u32, px_per_mm: f64, angle_deg: f64, keystone: f64) -> [Point2<f64>; 4] {
    let (hw, hh) = (0.5 * SHEET_MM.0 * px_per_mm, 0.5 * SHEET_MM.1 * px_per_mm);
    let top = hw * (1.0 - keystone);
    let local = [(-top, -hh), (top, -hh), (hw, hh), (-hw, hh)];
    let (s, c) = angle_deg.to_radians().sin_cos();
    let (cx, cy) = (0.5 * width as f64, 0.5 * height as f64);
    local.map(|(x, y)| Point2::new(cx + c * x - s * y, cy + s * x + c * y))
}

impl Scene {
    pub fn new(width: u32, height: u32, corners: [Point2<f64>; 4]) -> Self {
        Self {
            width,
            height,
            corners,
            shapes: Vec::new(),
            gradient: false,
        }
    }

    pub fn with(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn lit_from_right(mut self) -> Self {
        self.gradient = true;
        self
    }

    fn photo_to_sheet(&self) -> Homography {
        let (w, h) = SHEET_MM;
        let sheet = [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ];
        homography_from_4pt(&self.corners, &sheet).expect("scene corners form a valid quad")
    }

    /// Render with 4x4 supersampling; pixel `(x, y)` covers
    /// `[x - 0.5, x + 0.5]`.
    pub fn render(&self) -> RgbImage {
        let to_sheet = self.photo_to_sheet();
        let (sw, sh) = SHEET_MM;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let mut acc = 0.0;
            for sy in 0..4 {
                for sx in 0..4 {
                    let px = x as f64 - 0.5 + (sx as f64 + 0.5) / 4.0;
                    let py = y as f64 - 0.5 + (sy as f64 + 0.5) / 4.0;
                    let m = to_sheet.apply(Point2::new(px, py));
                    let on_sheet = (0.0..=sw).contains(&m.x) && (0.0..=sh).contains(&m.y);
                    acc += if !on_sheet {
                        45.0
                    } else if self.shapes.iter().any(|s| s.contains(m.x, m.y)) {
                        55.0
                    } else {
                        235.0
                    };
                }
            }
            let light = if self.gradient {
                0.75 + 0.25 * x as f64 / self.width as f64
            } else {
                1.0
            };
            let v = (acc / 16.0 * light).round().clamp(0.0, 255.0) as u8;
            Rgb([v, v, v])
        })
    }
}

/// Pad `img` with a dark border of `margin` pixels on every side.
pub fn on_table(img: &RgbImage, margin: u32) -> RgbImage {
    let mut out = RgbImage::from_pixel(img.width() + 2 * margin, img.height() + 2 * margin, Rgb([45, 45, 45]));
    image::imageops::replace(&mut out, img, margin as i64, margin as i64);
    out
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
