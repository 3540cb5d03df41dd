//! Dimensioning of one object outline: principal-axis size, shape class and
//! round-shape metrics.

use std::f64::consts::PI;

use image::GrayImage;
use nalgebra::Point2;
use paperscale_core::{
    approx_poly_dp, fit_ellipse, min_area_rect, refine_edge_points, refine_points, round_to, Contour,
    Refinement, RotatedRect,
};

use crate::expand::expand_contour;
use crate::params::ShapeParams;
use crate::types::{EllipseRender, MeasuredObject, ShapeKind, ShapeMetrics};

/// Label the sides of a rotated rectangle relative to the canvas axes.
///
/// Returns `(width_px, height_px, angle_deg)`: when the long side is within
/// 45 degrees of horizontal it becomes the width, otherwise the height, and
/// the angle then follows the width axis.
pub(crate) fn orient(rect: &RotatedRect) -> (f64, f64, f64) {
    let a = rect.angle_deg.rem_euclid(180.0);
    if !(45.0..=135.0).contains(&a) {
        (rect.long, rect.short, a)
    } else {
        (rect.short, rect.long, (a + 90.0) % 180.0)
    }
}

pub(crate) fn classify(circularity: f64, aspect: f64, vertices: usize, params: &ShapeParams) -> ShapeKind {
    if circularity > params.circle_circularity
        && aspect < params.circle_max_aspect
        && vertices >= params.circle_min_vertices
    {
        ShapeKind::Circle
    } else if circularity > params.ellipse_circularity && vertices >= params.ellipse_min_vertices {
        ShapeKind::Ellipse
    } else {
        ShapeKind::Polygon
    }
}

fn refined_corners(gray: &GrayImage, pts: &[Point2<f64>], params: &ShapeParams) -> Vec<Point2<f64>> {
    refine_points(gray, pts, &params.edge_refine)
        .into_iter()
        .map(|r| r.into_inner())
        .collect()
}

/// Snap dense outline points onto the edge; points with no edge in reach
/// are dropped so they cannot pull the ellipse fit outward.
fn refined_rim(gray: &GrayImage, pts: &[Point2<f64>], params: &ShapeParams) -> Vec<Point2<f64>> {
    let rim: Vec<Point2<f64>> = refine_edge_points(gray, pts, &params.edge_refine)
        .into_iter()
        .filter_map(|r| match r {
            Refinement::Refined(p) => Some(p),
            Refinement::Unavailable(_) => None,
        })
        .collect();
    if rim.len() >= 5 {
        rim
    } else {
        log::debug!("edge refinement found only {} rim points, keeping the outline", rim.len());
        pts.to_vec()
    }
}

fn round_point(p: &Point2<f64>) -> [f64; 2] {
    [round_to(p.x, 2), round_to(p.y, 2)]
}

/// Measure one deduplicated outline on the rectified canvas.
///
/// `gray` is the raw grayscale canvas used for sub-pixel edge refinement and
/// `scale` converts canvas pixels to millimetres.
pub fn measure_shape(
    contour: &Contour,
    id: usize,
    scale: f64,
    gray: &GrayImage,
    params: &ShapeParams,
) -> MeasuredObject {
    let rect = min_area_rect(&contour.points);
    let aspect = rect.map(|r| r.aspect_ratio()).unwrap_or(1.0);

    let area = contour.area();
    let centroid = contour
        .centroid()
        .or_else(|| rect.map(|r| r.center))
        .unwrap_or_else(Point2::origin);

    // Hull perimeter keeps small notches from dragging circularity down.
    let hull = contour.hull();
    let hull_perimeter = hull.perimeter();
    let circularity = if hull_perimeter > 0.0 {
        4.0 * PI * area / (hull_perimeter * hull_perimeter)
    } else {
        0.0
    };
    let vertices = approx_poly_dp(&hull.points, params.vertex_eps_frac * hull_perimeter, true).len();
    let mut shape = classify(circularity, aspect, vertices, params);

    let outline_eps = params.outline_eps_frac * hull_perimeter;
    let mut outline = approx_poly_dp(&contour.points, outline_eps, true);
    if outline.len() > params.max_outline_vertices {
        outline = approx_poly_dp(&hull.points, outline_eps, true);
    }
    if shape == ShapeKind::Polygon {
        outline = refined_corners(gray, &outline, params);
    }

    let grow = if shape.is_round() {
        params.round_expand_px
    } else {
        params.polygon_expand_px
    };
    let expanded = expand_contour(contour, grow);
    let dense = if shape.is_round() {
        refined_rim(gray, &expanded.points, params)
    } else {
        expanded.points.clone()
    };

    let (width_px, height_px, angle) = min_area_rect(&dense)
        .or(rect)
        .map(|r| orient(&r))
        .unwrap_or((0.0, 0.0, 0.0));
    let mut width_mm = round_to(width_px * scale, 2);
    let mut height_mm = round_to(height_px * scale, 2);

    let mut ellipse_render = None;
    let mut metrics = None;
    if shape.is_round() && dense.len() >= 5 {
        match fit_ellipse(&dense).filter(|e| e.is_valid()) {
            Some(e) => {
                ellipse_render = Some(EllipseRender {
                    cx: round_to(e.center.x, 2),
                    cy: round_to(e.center.y, 2),
                    rx: round_to(e.semi_major, 2),
                    ry: round_to(e.semi_minor, 2),
                    angle_deg: round_to(e.angle_deg(), 2),
                });
                let a_mm = e.semi_major * scale;
                let b_mm = e.semi_minor * scale;
                if shape == ShapeKind::Circle {
                    let r_mm = 0.5 * (a_mm + b_mm);
                    width_mm = round_to(2.0 * r_mm, 2);
                    height_mm = width_mm;
                    metrics = Some(ShapeMetrics::Circle {
                        radius_mm: round_to(r_mm, 2),
                        diameter_mm: round_to(2.0 * r_mm, 2),
                        circumference_mm: round_to(2.0 * PI * r_mm, 2),
                    });
                } else {
                    width_mm = round_to(2.0 * a_mm, 2);
                    height_mm = round_to(2.0 * b_mm, 2);
                    metrics = Some(ShapeMetrics::Ellipse {
                        major_axis_mm: width_mm,
                        minor_axis_mm: height_mm,
                        eccentricity: round_to(e.eccentricity(), 4),
                        perimeter_mm: round_to(e.perimeter() * scale, 2),
                    });
                }
            }
            None => {
                log::warn!("object {id}: ellipse fit failed, reporting as polygon");
                shape = ShapeKind::Polygon;
            }
        }
    }

    MeasuredObject {
        id,
        polygon_points: outline.iter().map(round_point).collect(),
        centroid: [round_to(centroid.x, 1), round_to(centroid.y, 1)],
        width_mm,
        height_mm,
        area_mm2: round_to(expanded.area() * scale * scale, 2),
        angle_deg: round_to(angle, 1),
        shape_type: shape,
        circularity: round_to(circularity, 3),
        ellipse_render,
        metrics,
    }
}
