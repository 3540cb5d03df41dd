//! Geometry, filtering and contour primitives for paper-referenced photo
//! metrology.
//!
//! Everything here works on `image` buffers and `nalgebra` points in pixel
//! units. The sheet and object stages in the sibling crates are built on top
//! of these pieces.

mod cascade;
mod contour;
mod ellipse;
pub mod filters;
mod geometry;
mod homography;
mod logger;
mod min_area_rect;
mod raster;
mod subpix;

pub use cascade::{collect_all, first_success, run_strategy, Strategy};
pub use contour::{external_contours, fill_contour, Contour};
pub use ellipse::{fit_ellipse, Ellipse};
pub use geometry::{
    approx_poly_dp, arc_length, convex_hull, order_quad, polygon_area, quad_aspect_ratio,
    signed_area, BoundingBox, Moments,
};
pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};
pub use min_area_rect::{min_area_rect, RotatedRect};
pub use raster::{sample_bilinear_clamped, sample_bilinear_gray, sample_bilinear_rgb, to_gray};
pub use subpix::{refine_edge_point, refine_edge_points, refine_point, refine_points, Refinement, SubPixParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}
