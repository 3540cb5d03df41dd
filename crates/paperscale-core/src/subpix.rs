//! Gradient-based sub-pixel point refinement.
//!
//! Each point is moved to the location that best agrees with the image
//! gradients in a Gaussian-weighted window: every gradient vector should be
//! orthogonal to the offset from the refined point to its pixel. This pulls
//! corners onto their apex.
//!
//! Points on a smooth outline use [`refine_edge_point`] instead, which only
//! moves along the gradient and reads the edge off a 1-D intensity profile.

use crate::raster::sample_bilinear_clamped;
use image::GrayImage;
use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Window and termination settings for [`refine_point`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixParams {
    /// Search window is `(2 * half_window + 1)^2` pixels.
    pub half_window: u32,
    pub max_iters: u32,
    /// Stop once an update moves the point by less than this many pixels.
    pub epsilon: f64,
}

impl Default for SubPixParams {
    fn default() -> Self {
        Self {
            half_window: 11,
            max_iters: 40,
            epsilon: 0.001,
        }
    }
}

impl SubPixParams {
    /// Smaller window used on object outlines.
    pub fn edge() -> Self {
        Self {
            half_window: 7,
            ..Self::default()
        }
    }
}

/// Outcome of an optional refinement step.
///
/// `Unavailable` carries the unrefined input so callers can keep going with
/// the coarse value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Refinement<T> {
    Refined(T),
    Unavailable(T),
}

impl<T> Refinement<T> {
    pub fn is_refined(&self) -> bool {
        matches!(self, Refinement::Refined(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Refinement::Refined(v) | Refinement::Unavailable(v) => v,
        }
    }
}

/// Gaussian-weighted structure tensor around `q` and the matching
/// right-hand side of the gradient-orthogonality system.
fn gradient_moments(img: &GrayImage, q: Point2<f64>, win: i32) -> (Matrix2<f64>, Vector2<f64>) {
    let coeff = 1.0 / (win * win) as f64;
    let sample = |x: f64, y: f64| sample_bilinear_clamped(img, x as f32, y as f32) as f64;
    let mut m = Matrix2::<f64>::zeros();
    let mut rhs = Vector2::<f64>::zeros();
    for j in -win..=win {
        for i in -win..=win {
            let weight = (-((i * i + j * j) as f64) * coeff).exp();
            let x = q.x + i as f64;
            let y = q.y + j as f64;
            let gx = 0.5 * (sample(x + 1.0, y) - sample(x - 1.0, y));
            let gy = 0.5 * (sample(x, y + 1.0) - sample(x, y - 1.0));
            let gxx = weight * gx * gx;
            let gxy = weight * gx * gy;
            let gyy = weight * gy * gy;
            m[(0, 0)] += gxx;
            m[(0, 1)] += gxy;
            m[(1, 1)] += gyy;
            rhs[0] += gxx * i as f64 + gxy * j as f64;
            rhs[1] += gxy * i as f64 + gyy * j as f64;
        }
    }
    m[(1, 0)] = m[(0, 1)];
    (m, rhs)
}

/// Refine a single point. Falls back to the input when the local gradient
/// system is singular, the point leaves the image, or the result drifts
/// farther than the window from where it started.
pub fn refine_point(img: &GrayImage, p: Point2<f64>, params: &SubPixParams) -> Refinement<Point2<f64>> {
    let (w, h) = img.dimensions();
    let in_bounds = |q: Point2<f64>| {
        q.x.is_finite() && q.y.is_finite() && q.x >= 0.0 && q.y >= 0.0 && q.x < w as f64 && q.y < h as f64
    };
    if params.half_window == 0 || !in_bounds(p) {
        return Refinement::Unavailable(p);
    }

    let win = params.half_window as i32;
    let eps2 = params.epsilon * params.epsilon;

    let mut q = p;
    let mut solved_once = false;
    for _ in 0..params.max_iters.max(1) {
        let (m, rhs) = gradient_moments(img, q, win);

        let det = m.determinant();
        let scale = m[(0, 0)] * m[(1, 1)];
        if scale <= 0.0 || det.abs() <= 1e-9 * scale {
            break;
        }
        let Some(inv) = m.try_inverse() else {
            break;
        };
        let step = inv * rhs;
        solved_once = true;
        let next = q + step;
        if !in_bounds(next) {
            break;
        }
        q = next;
        if step.norm_squared() <= eps2 {
            break;
        }
    }

    if !solved_once || (q.x - p.x).abs() > win as f64 || (q.y - p.y).abs() > win as f64 {
        return Refinement::Unavailable(p);
    }
    Refinement::Refined(q)
}

/// Smallest intensity change per pixel accepted as an edge.
const MIN_EDGE_STEP: f64 = 4.0;

/// Unit eigenvector of the dominant gradient direction, if any.
fn dominant_direction(m: &Matrix2<f64>) -> Option<Vector2<f64>> {
    let (a, b, c) = (m[(0, 0)], m[(0, 1)], m[(1, 1)]);
    let trace = a + c;
    if !trace.is_finite() || trace <= 0.0 {
        return None;
    }
    let lambda = 0.5 * trace + (0.25 * (a - c) * (a - c) + b * b).sqrt();
    let v = if b.abs() > 1e-12 * trace {
        Vector2::new(b, lambda - a)
    } else if a >= c {
        Vector2::new(1.0, 0.0)
    } else {
        Vector2::new(0.0, 1.0)
    };
    v.try_normalize(1e-12)
}

/// Offset along `n` of the strongest edge crossing the line through `q`,
/// from the centroid of the derivative peak of the intensity profile.
fn edge_offset(img: &GrayImage, q: Point2<f64>, n: Vector2<f64>, win: i32) -> Option<f64> {
    const STEP: f64 = 0.5;
    let count = (2.0 * win as f64 / STEP) as usize + 1;
    let profile: Vec<f64> = (0..count)
        .map(|k| {
            let t = k as f64 * STEP - win as f64;
            let s = q + n * t;
            sample_bilinear_clamped(img, s.x as f32, s.y as f32) as f64
        })
        .collect();
    // Central difference over one pixel.
    let deriv: Vec<f64> = (0..count)
        .map(|k| {
            if k == 0 || k + 1 == count {
                0.0
            } else {
                (profile[k + 1] - profile[k - 1]).abs()
            }
        })
        .collect();

    let (peak, &max) = deriv
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    if max < MIN_EDGE_STEP {
        return None;
    }
    let floor = 0.1 * max;
    let mut lo = peak;
    while lo > 0 && deriv[lo - 1] >= floor {
        lo -= 1;
    }
    let mut hi = peak;
    while hi + 1 < count && deriv[hi + 1] >= floor {
        hi += 1;
    }
    let (mut acc, mut mass) = (0.0, 0.0);
    for (k, &d) in deriv.iter().enumerate().take(hi + 1).skip(lo) {
        acc += d * (k as f64 * STEP - win as f64);
        mass += d;
    }
    (mass > 0.0).then(|| acc / mass)
}

/// Move a point onto the nearest strong edge, stepping only along the local
/// gradient direction.
///
/// Suited to dense outline points: the point cannot slide along the edge, so
/// a curved boundary is sampled where the point actually lies. The result is
/// `Unavailable` when no edge crosses the window or the point would leave
/// the image.
pub fn refine_edge_point(img: &GrayImage, p: Point2<f64>, params: &SubPixParams) -> Refinement<Point2<f64>> {
    let (w, h) = img.dimensions();
    let in_bounds = |q: Point2<f64>| {
        q.x.is_finite() && q.y.is_finite() && q.x >= 0.0 && q.y >= 0.0 && q.x < w as f64 && q.y < h as f64
    };
    if params.half_window == 0 || !in_bounds(p) {
        return Refinement::Unavailable(p);
    }
    let win = params.half_window as i32;

    let mut q = p;
    let mut moved = false;
    for _ in 0..params.max_iters.clamp(1, 5) {
        let (m, _) = gradient_moments(img, q, win);
        let Some(n) = dominant_direction(&m) else {
            break;
        };
        let Some(t) = edge_offset(img, q, n, win) else {
            break;
        };
        let next = q + n * t;
        if !in_bounds(next) || (next - p).norm() > win as f64 {
            break;
        }
        q = next;
        moved = true;
        if t.abs() <= params.epsilon {
            break;
        }
    }

    if moved {
        Refinement::Refined(q)
    } else {
        Refinement::Unavailable(p)
    }
}

/// [`refine_edge_point`] over a whole outline.
pub fn refine_edge_points(
    img: &GrayImage,
    pts: &[Point2<f64>],
    params: &SubPixParams,
) -> Vec<Refinement<Point2<f64>>> {
    pts.iter().map(|&p| refine_edge_point(img, p, params)).collect()
}

/// Refine every point independently with the same settings.
pub fn refine_points(
    img: &GrayImage,
    pts: &[Point2<f64>],
    params: &SubPixParams,
) -> Vec<Refinement<Point2<f64>>> {
    pts.iter().map(|&p| refine_point(img, p, params)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Bright quadrant `x >= cx, y >= cy` on dark, anti-aliased at the edges.
    fn corner_image(cx: f64, cy: f64) -> GrayImage {
        let mut img = GrayImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let fx = ((x as f64 + 0.5 - cx).clamp(-0.5, 0.5)) + 0.5;
            let fy = ((y as f64 + 0.5 - cy).clamp(-0.5, 0.5)) + 0.5;
            *px = Luma([(30.0 + 200.0 * fx * fy).round() as u8]);
        }
        img
    }

    #[test]
    fn corner_moves_to_subpixel_apex() {
        let img = corner_image(30.3, 28.6);
        let r = refine_point(&img, Point2::new(32.0, 27.0), &SubPixParams::default());
        assert!(r.is_refined());
        let q = r.into_inner();
        assert!((q.x - 29.8).abs() < 0.35, "x = {}", q.x);
        assert!((q.y - 28.1).abs() < 0.35, "y = {}", q.y);
    }

    /// Dark disc of radius `r` centred at `(c, c)` on bright paper, 4x4
    /// supersampled with pixel centres at integer coordinates.
    fn disc_image(size: u32, c: f64, r: f64) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let mut inside = 0;
            for sy in 0..4 {
                for sx in 0..4 {
                    let px = x as f64 - 0.5 + (sx as f64 + 0.5) / 4.0;
                    let py = y as f64 - 0.5 + (sy as f64 + 0.5) / 4.0;
                    if (px - c).powi(2) + (py - c).powi(2) <= r * r {
                        inside += 1;
                    }
                }
            }
            Luma([(220.0 - 170.0 * inside as f64 / 16.0).round() as u8])
        })
    }

    #[test]
    fn straight_edge_is_located_along_its_normal() {
        // Bright for x >= 30.3 in pixel-area coordinates, i.e. 29.8 in
        // sample coordinates.
        let img = GrayImage::from_fn(64, 64, |x, _| {
            let f = ((x as f64 + 0.5 - 30.3).clamp(-0.5, 0.5)) + 0.5;
            Luma([(30.0 + 200.0 * f).round() as u8])
        });
        let r = refine_edge_point(&img, Point2::new(34.0, 20.0), &SubPixParams::edge());
        assert!(r.is_refined());
        let q = r.into_inner();
        assert!((q.x - 29.8).abs() < 0.1, "x = {}", q.x);
        assert!((q.y - 20.0).abs() < 1e-6, "y = {}", q.y);
    }

    #[test]
    fn expanded_disc_outline_lands_on_the_rim() {
        let (c, radius) = (50.0, 20.0);
        let img = disc_image(100, c, radius);
        let pts: Vec<Point2<f64>> = (0..24)
            .map(|k| {
                let a = (k as f64 * 15.0 + 7.0).to_radians();
                Point2::new(c + 24.0 * a.cos(), c + 24.0 * a.sin())
            })
            .collect();
        for (r, start) in refine_edge_points(&img, &pts, &SubPixParams::edge()).into_iter().zip(&pts) {
            assert!(r.is_refined(), "start {start:?}");
            let q = r.into_inner();
            let dist = ((q.x - c).powi(2) + (q.y - c).powi(2)).sqrt();
            assert!((dist - radius).abs() < 0.2, "start {start:?} -> radius {dist}");
        }
    }

    #[test]
    fn edge_refinement_needs_an_edge() {
        let img = GrayImage::from_pixel(40, 40, Luma([128]));
        let p = Point2::new(20.0, 20.0);
        assert_eq!(refine_edge_point(&img, p, &SubPixParams::edge()), Refinement::Unavailable(p));
    }

    #[test]
    fn flat_region_is_unavailable() {
        let img = GrayImage::from_pixel(40, 40, Luma([128]));
        let p = Point2::new(20.0, 20.0);
        assert_eq!(refine_point(&img, p, &SubPixParams::default()), Refinement::Unavailable(p));
    }

    #[test]
    fn out_of_image_points_are_left_alone() {
        let img = corner_image(30.0, 30.0);
        let p = Point2::new(-3.0, 10.0);
        assert!(!refine_point(&img, p, &SubPixParams::edge()).is_refined());
    }
}
