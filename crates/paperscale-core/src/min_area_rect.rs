//! Minimum-area enclosing rectangle via rotating calipers over the hull.

use crate::geometry::convex_hull;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Rotated rectangle normalized so `long >= short`.
///
/// `angle_deg` is the direction of the long side in `[0, 180)`, measured in
/// image coordinates (x right, y down).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f64>,
    pub long: f64,
    pub short: f64,
    pub angle_deg: f64,
}

impl RotatedRect {
    /// `long / short`, or 1.0 for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> f64 {
        if self.short > 0.0 {
            self.long / self.short
        } else {
            1.0
        }
    }

    /// Corner points in order around the rectangle.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let t = self.angle_deg.to_radians();
        let u = Vector2::new(t.cos(), t.sin()) * (0.5 * self.long);
        let v = Vector2::new(-t.sin(), t.cos()) * (0.5 * self.short);
        let c = self.center;
        [c - u - v, c + u - v, c + u + v, c - u + v]
    }
}

pub(crate) fn normalize_angle_deg(a: f64) -> f64 {
    let r = a.rem_euclid(180.0);
    if r >= 180.0 {
        0.0
    } else {
        r
    }
}

/// Minimum-area rectangle enclosing `pts`. `None` for an empty input.
pub fn min_area_rect(pts: &[Point2<f64>]) -> Option<RotatedRect> {
    let hull = convex_hull(pts);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                long: 0.0,
                short: 0.0,
                angle_deg: 0.0,
            })
        }
        2 => {
            let d = hull[1] - hull[0];
            return Some(RotatedRect {
                center: Point2::from((hull[0].coords + hull[1].coords) * 0.5),
                long: d.norm(),
                short: 0.0,
                angle_deg: normalize_angle_deg(d.y.atan2(d.x).to_degrees()),
            });
        }
        _ => {}
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..hull.len() {
        let edge = hull[(i + 1) % hull.len()] - hull[i];
        let len = edge.norm();
        if len < 1e-12 {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut u_min, mut u_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let pu = p.coords.dot(&u);
            let pv = p.coords.dot(&v);
            u_min = u_min.min(pu);
            u_max = u_max.max(pu);
            v_min = v_min.min(pv);
            v_max = v_max.max(pv);
        }

        let du = u_max - u_min;
        let dv = v_max - v_min;
        let area = du * dv;
        if best.as_ref().is_some_and(|(a, _)| area >= *a) {
            continue;
        }

        let center = Point2::from(u * (0.5 * (u_min + u_max)) + v * (0.5 * (v_min + v_max)));
        let (long, short, axis) = if du >= dv { (du, dv, u) } else { (dv, du, v) };
        let rect = RotatedRect {
            center,
            long,
            short,
            angle_deg: normalize_angle_deg(axis.y.atan2(axis.x).to_degrees()),
        };
        best = Some((area, rect));
    }

    best.map(|(_, r)| r)
}
