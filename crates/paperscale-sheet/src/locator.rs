//! Find the reference sheet's quadrilateral in a photo.

use image::GrayImage;
use nalgebra::Point2;
use paperscale_core::filters::close_square;
use paperscale_core::{
    approx_poly_dp, external_contours, first_success, order_quad, quad_aspect_ratio, refine_point,
    Contour, Strategy,
};
use serde::{Deserialize, Serialize};

use crate::error::SheetDetectError;
use crate::params::SheetParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Located sheet corners in source-image pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetQuad {
    /// Top-left, top-right, bottom-right, bottom-left.
    pub corners: [Point2<f64>; 4],
    /// Long over short side of the coarse quad.
    pub aspect_ratio: f64,
    /// Recipe that produced the accepted mask.
    pub strategy: Strategy,
    /// Number of corners moved by sub-pixel refinement.
    pub refined_corners: usize,
}

/// Locate the sheet in a grayscale photo.
///
/// Strategies run in order; within a strategy the largest contours are
/// tried first and the first quad passing the area and aspect checks wins.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(gray, params), fields(width = gray.width(), height = gray.height()))
)]
pub fn locate_sheet(gray: &GrayImage, params: &SheetParams) -> Result<SheetQuad, SheetDetectError> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Err(SheetDetectError::InvalidImage { width: w, height: h });
    }
    let image_area = w as f64 * h as f64;

    let found = first_success(&params.strategies, gray, |strategy, mask| {
        let closed = close_square(&mask, params.close_iterations);
        let (corners, aspect_ratio) = find_quad(&closed, image_area, params)?;
        Some((strategy.clone(), corners, aspect_ratio))
    });

    let Some((strategy, coarse, aspect_ratio)) = found else {
        log::info!("no sheet candidate survived {} strategies", params.strategies.len());
        return Err(SheetDetectError::not_detected());
    };
    log::info!("sheet located by {strategy} (aspect {aspect_ratio:.3})");

    let mut refined_corners = 0;
    let mut corners = coarse;
    for c in corners.iter_mut() {
        let r = refine_point(gray, *c, &params.corner_refine);
        if r.is_refined() {
            refined_corners += 1;
        } else {
            log::debug!("corner ({:.1}, {:.1}) kept unrefined", c.x, c.y);
        }
        *c = r.into_inner();
    }

    Ok(SheetQuad {
        corners: order_quad(&corners),
        aspect_ratio,
        strategy,
        refined_corners,
    })
}

/// Largest sheet-like quad in a closed edge/region mask.
fn find_quad(
    mask: &GrayImage,
    image_area: f64,
    params: &SheetParams,
) -> Option<([Point2<f64>; 4], f64)> {
    let mut contours: Vec<(f64, Contour)> = external_contours(mask)
        .into_iter()
        .map(|c| (c.area(), c))
        .collect();
    contours.sort_by(|a, b| b.0.total_cmp(&a.0));

    let (min_ar, max_ar) = params.aspect_bounds();
    for (area, contour) in contours.iter().take(params.max_candidates) {
        let frac = area / image_area;
        if frac < params.min_area_frac {
            // Sorted by area, nothing further can pass.
            break;
        }
        if frac > params.max_area_frac {
            log::debug!("candidate rejected: covers {:.1}% of the frame", frac * 100.0);
            continue;
        }

        let perimeter = contour.perimeter();
        for eps in &params.approx_eps_fracs {
            let approx = approx_poly_dp(&contour.points, eps * perimeter, true);
            let Ok(quad) = <[Point2<f64>; 4]>::try_from(approx) else {
                continue;
            };
            let ordered = order_quad(&quad);
            let Some(ar) = quad_aspect_ratio(&ordered) else {
                continue;
            };
            if ar < min_ar || ar > max_ar {
                log::debug!("quad rejected: aspect {ar:.3} outside [{min_ar:.3}, {max_ar:.3}]");
                continue;
            }
            return Some((ordered, ar));
        }
    }
    None
}
