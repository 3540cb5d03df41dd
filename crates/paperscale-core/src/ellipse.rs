//! Direct least-squares ellipse fit (Fitzgibbon, Pilu & Fisher).
//!
//! The fit works on Hartley-normalized points and solves the reduced 3x3
//! generalized eigenproblem through its characteristic cubic, so it needs no
//! general non-symmetric eigen decomposition.

use nalgebra::{Matrix3, Point2, SMatrix, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Geometric ellipse with `semi_major >= semi_minor`.
///
/// `angle_rad` is the direction of the major axis in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2<f64>,
    pub semi_major: f64,
    pub semi_minor: f64,
    pub angle_rad: f64,
}

impl Ellipse {
    pub fn is_valid(&self) -> bool {
        self.semi_major > 0.0
            && self.semi_minor > 0.0
            && self.semi_major.is_finite()
            && self.semi_minor.is_finite()
            && self.center.x.is_finite()
            && self.center.y.is_finite()
            && self.angle_rad.is_finite()
    }

    /// `sqrt(1 - (b/a)^2)`; zero for a circle.
    pub fn eccentricity(&self) -> f64 {
        let r = self.semi_minor / self.semi_major;
        (1.0 - r * r).max(0.0).sqrt()
    }

    /// Ramanujan's second approximation of the circumference.
    pub fn perimeter(&self) -> f64 {
        let (a, b) = (self.semi_major, self.semi_minor);
        let h = ((a - b) / (a + b)).powi(2);
        PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
    }

    /// Major-axis direction in degrees, folded into `[0, 180)`.
    pub fn angle_deg(&self) -> f64 {
        crate::min_area_rect::normalize_angle_deg(self.angle_rad.to_degrees())
    }

    /// `n` points evenly spaced in the parametric angle.
    pub fn sample_points(&self, n: usize) -> Vec<Point2<f64>> {
        let (s, c) = self.angle_rad.sin_cos();
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                let px = self.semi_major * t.cos();
                let py = self.semi_minor * t.sin();
                Point2::new(self.center.x + c * px - s * py, self.center.y + s * px + c * py)
            })
            .collect()
    }
}

/// Fit an ellipse to at least five boundary points.
///
/// Returns `None` when the points are degenerate or the best conic is not a
/// bounded ellipse.
pub fn fit_ellipse(points: &[Point2<f64>]) -> Option<Ellipse> {
    if points.len() < 5 {
        return None;
    }

    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let my = points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p.x - mx).powi(2) + (p.y - my).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        return None;
    };

    let mut scatter = SMatrix::<f64, 6, 6>::zeros();
    for p in points {
        let x = (p.x - mx) * s;
        let y = (p.y - my) * s;
        let row = SMatrix::<f64, 6, 1>::from([x * x, x * y, y * y, x, y, 1.0]);
        scatter += row * row.transpose();
    }

    let s11: Matrix3<f64> = scatter.fixed_view::<3, 3>(0, 0).into_owned();
    let s12: Matrix3<f64> = scatter.fixed_view::<3, 3>(0, 3).into_owned();
    let s22: Matrix3<f64> = scatter.fixed_view::<3, 3>(3, 3).into_owned();

    let s22_inv = s22.try_inverse()?;
    let m = s11 - s12 * s22_inv * s12.transpose();
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);
    let system = c1.try_inverse()? * m;

    let a1 = constrained_eigenvector(&system)?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let conic = denormalize([a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]], mx, my, s);
    let e = conic_to_ellipse(conic)?;
    e.is_valid().then_some(e)
}

/// Eigenvector of `system` satisfying `4ac - b^2 > 0` with the smallest
/// eigenvalue magnitude.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let tr = a.trace();
    let minors = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in cubic_real_roots(-tr, minors, -det) {
        let Some(v) = null_vector(&(system - Matrix3::identity() * ev)) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.as_ref().is_none_or(|(b, _)| ev.abs() < *b) {
            best = Some((ev.abs(), v));
        }
    }
    best.map(|(_, v)| v)
}

/// Null vector of a rank-2 3x3 matrix: the largest adjugate row.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)],
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)],
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)],
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)],
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];
    let best = rows
        .iter()
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))?;
    let norm = best.norm();
    (norm > 1e-15).then(|| best / norm)
}

/// Real roots of `x^3 + b x^2 + c x + d`.
fn cubic_real_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;
    let disc = -4.0 * p * p * p - 27.0 * q * q;

    if disc >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| 2.0 * r * ((theta + 2.0 * PI * k as f64) / 3.0).cos() + shift)
            .collect()
    } else {
        let sq = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        vec![(-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt() + shift]
    }
}

/// Undo `x' = s (x - mx)`, `y' = s (y - my)` on conic coefficients.
fn denormalize(c: [f64; 6], mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a_, b_, c_, d_, e_, f_] = c;
    let s2 = s * s;
    [
        a_ * s2,
        b_ * s2,
        c_ * s2,
        -2.0 * a_ * s2 * mx - b_ * s2 * my + d_ * s,
        -b_ * s2 * mx - 2.0 * c_ * s2 * my + e_ * s,
        a_ * s2 * mx * mx + b_ * s2 * mx * my + c_ * s2 * my * my - d_ * s * mx - e_ * s * my + f_,
    ]
}

/// General conic `A x^2 + B xy + C y^2 + D x + E y + F = 0` to geometric form.
fn conic_to_ellipse([a, b, c, d, e, f]: [f64; 6]) -> Option<Ellipse> {
    let denom = 4.0 * a * c - b * b;
    if denom <= 0.0 {
        return None;
    }

    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    let angle = if (a - c).abs() < 1e-15 {
        if b > 0.0 {
            FRAC_PI_4
        } else if b < 0.0 {
            -FRAC_PI_4
        } else {
            0.0
        }
    } else {
        0.5 * b.atan2(a - c)
    };

    let sum = a + c;
    let diff = ((a - c).powi(2) + b * b).sqrt();
    let l1 = 0.5 * (sum + diff);
    let l2 = 0.5 * (sum - diff);

    let f0 = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if f0.abs() < 1e-15 {
        return None;
    }
    let r1 = -f0 / l1;
    let r2 = -f0 / l2;
    if r1 <= 0.0 || r2 <= 0.0 {
        return None;
    }
    let (r1, r2) = (r1.sqrt(), r2.sqrt());

    let (semi_major, semi_minor, angle_rad) = if r1 >= r2 {
        (r1, r2, angle)
    } else {
        (r2, r1, angle + FRAC_PI_2)
    };

    Some(Ellipse {
        center: Point2::new(cx, cy),
        semi_major,
        semi_minor,
        angle_rad,
    })
}
