//! Planar polygon primitives shared by the sheet and object stages.
//!
//! All functions operate on `nalgebra::Point2<f64>` in pixel units. Closed
//! polylines are stored without repeating the first vertex.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Signed shoelace area. Positive for counter-clockwise order in a y-up frame.
pub fn signed_area(pts: &[Point2<f64>]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in pts.iter().enumerate() {
        let q = pts[(i + 1) % pts.len()];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

/// Absolute enclosed area of a closed polygon.
pub fn polygon_area(pts: &[Point2<f64>]) -> f64 {
    signed_area(pts).abs()
}

/// Length of a polyline; `closed` adds the segment back to the first vertex.
pub fn arc_length(pts: &[Point2<f64>], closed: bool) -> f64 {
    if pts.len() < 2 {
        return 0.0;
    }
    let mut len: f64 = pts.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    if closed {
        len += (pts[0] - pts[pts.len() - 1]).norm();
    }
    len
}

/// First-order polygon moments (Green's theorem over the outline).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    pub fn of_polygon(pts: &[Point2<f64>]) -> Self {
        let mut m = Moments::default();
        if pts.len() < 3 {
            return m;
        }
        for (i, p) in pts.iter().enumerate() {
            let q = pts[(i + 1) % pts.len()];
            let cross = p.x * q.y - q.x * p.y;
            m.m00 += cross;
            m.m10 += (p.x + q.x) * cross;
            m.m01 += (p.y + q.y) * cross;
        }
        m.m00 *= 0.5;
        m.m10 /= 6.0;
        m.m01 /= 6.0;
        m
    }

    /// Centroid, or `None` for a zero-mass outline.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        if self.m00.abs() < 1e-9 {
            return None;
        }
        Some(Point2::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

#[inline]
fn cross(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull (Andrew's monotone chain). Collinear points are dropped.
pub fn convex_hull(pts: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted: Vec<Point2<f64>> = pts.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn line_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let d = b - a;
    let len = d.norm();
    if len < 1e-12 {
        return (p - a).norm();
    }
    (d.x * (a.y - p.y) - d.y * (a.x - p.x)).abs() / len
}

/// Douglas-Peucker over an open run; returns kept flags for `run`.
fn simplify_run(run: &[Point2<f64>], epsilon: f64) -> Vec<bool> {
    let mut keep = vec![false; run.len()];
    if run.is_empty() {
        return keep;
    }
    keep[0] = true;
    keep[run.len() - 1] = true;

    let mut stack = vec![(0usize, run.len() - 1)];
    while let Some((s, e)) = stack.pop() {
        if e <= s + 1 {
            continue;
        }
        let mut best = (s, 0.0_f64);
        for i in s + 1..e {
            let d = line_distance(run[i], run[s], run[e]);
            if d > best.1 {
                best = (i, d);
            }
        }
        if best.1 > epsilon {
            keep[best.0] = true;
            stack.push((s, best.0));
            stack.push((best.0, e));
        }
    }
    keep
}

/// Douglas-Peucker polyline simplification.
///
/// Closed curves are split at two mutually distant vertices first so the
/// result does not depend on where the tracer started the outline.
pub fn approx_poly_dp(pts: &[Point2<f64>], epsilon: f64, closed: bool) -> Vec<Point2<f64>> {
    if pts.len() < 3 {
        return pts.to_vec();
    }
    if !closed {
        let keep = simplify_run(pts, epsilon);
        return pts
            .iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(*p))
            .collect();
    }

    let n = pts.len();
    let farthest_from = |from: usize| -> usize {
        let mut best = (from, 0.0_f64);
        for (i, p) in pts.iter().enumerate() {
            let d = (p - pts[from]).norm_squared();
            if d > best.1 {
                best = (i, d);
            }
        }
        best.0
    };
    let a = farthest_from(0);
    let b = farthest_from(a);
    if a == b {
        return vec![pts[a]];
    }

    let arc = |from: usize, to: usize| -> Vec<Point2<f64>> {
        let len = (to + n - from) % n;
        (0..=len).map(|k| pts[(from + k) % n]).collect()
    };

    let mut out = Vec::new();
    for (from, to) in [(a, b), (b, a)] {
        let run = arc(from, to);
        let keep = simplify_run(&run, epsilon);
        // Last vertex of each run is the first of the next one.
        for (p, k) in run.iter().zip(keep).take(run.len() - 1) {
            if k {
                out.push(*p);
            }
        }
    }
    out
}

/// Axis-aligned integer bounding box: the smallest block of whole pixels
/// covering every vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn of_points(pts: &[Point2<f64>]) -> Option<Self> {
        let first = pts.first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for p in pts {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        Some(Self {
            x,
            y,
            width: max_x.floor() as i32 - x + 1,
            height: max_y.floor() as i32 - y + 1,
        })
    }
}

/// Order four points as top-left, top-right, bottom-right, bottom-left.
///
/// The coordinate sum is minimal at top-left and maximal at bottom-right;
/// the difference `y - x` is minimal at top-right and maximal at bottom-left.
pub fn order_quad(pts: &[Point2<f64>; 4]) -> [Point2<f64>; 4] {
    let by = |key: &dyn Fn(&Point2<f64>) -> f64, max: bool| -> Point2<f64> {
        let mut best = pts[0];
        for p in &pts[1..] {
            let better = if max { key(p) > key(&best) } else { key(p) < key(&best) };
            if better {
                best = *p;
            }
        }
        best
    };
    let sum = |p: &Point2<f64>| p.x + p.y;
    let diff = |p: &Point2<f64>| p.y - p.x;
    [
        by(&sum, false),
        by(&diff, false),
        by(&sum, true),
        by(&diff, true),
    ]
}

/// Longer-over-shorter side ratio of an ordered quad, each side averaged
/// over its opposite pair. `None` when a side pair averages below one pixel.
pub fn quad_aspect_ratio(ordered: &[Point2<f64>; 4]) -> Option<f64> {
    let [tl, tr, br, bl] = *ordered;
    let w = 0.5 * ((tr - tl).norm() + (br - bl).norm());
    let h = 0.5 * ((bl - tl).norm() + (br - tr).norm());
    if w < 1.0 || h < 1.0 {
        return None;
    }
    Some(w.max(h) / w.min(h))
}
