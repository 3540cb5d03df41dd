//! Pool plausible object outlines from every object-cascade strategy.

use image::GrayImage;
use paperscale_core::filters::close_square;
use paperscale_core::{collect_all, external_contours, Contour, Strategy};

use crate::error::ObjectDetectError;
use crate::params::{Channel, ObjectParams};

/// Why a contour was dropped from the candidate pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    TooSmall { area: f64 },
    TooLarge { area: f64 },
    Sliver { width: i32, height: i32 },
    Concave { ratio: f64 },
}

/// Apply the size and convexity filters to one contour.
pub fn check_candidate(contour: &Contour, canvas_area: f64, params: &ObjectParams) -> Result<(), Rejection> {
    let area = contour.area();
    if area < params.min_area_px {
        return Err(Rejection::TooSmall { area });
    }
    if area > params.max_area_frac * canvas_area {
        return Err(Rejection::TooLarge { area });
    }
    let (width, height) = contour
        .bounding_box()
        .map(|b| (b.width, b.height))
        .unwrap_or((0, 0));
    if width < params.min_bbox_px || height < params.min_bbox_px {
        return Err(Rejection::Sliver { width, height });
    }
    let ratio = contour.convexity_ratio();
    if ratio > params.max_convexity {
        return Err(Rejection::Concave { ratio });
    }
    Ok(())
}

/// Run the object cascade over both channels and keep every contour that
/// passes [`check_candidate`].
///
/// The same physical object is usually found by several strategies; those
/// duplicates are left for the deduplicator.
pub fn extract_candidates(
    normalized: &GrayImage,
    raw: &GrayImage,
    params: &ObjectParams,
) -> Result<Vec<Contour>, ObjectDetectError> {
    let canvas_area = raw.width() as f64 * raw.height() as f64;
    let on = |channel: Channel| -> Vec<Strategy> {
        params
            .strategies
            .iter()
            .filter(|s| s.channel == channel)
            .map(|s| s.strategy.clone())
            .collect()
    };
    let normalized_set = on(Channel::Normalized);
    let raw_set = on(Channel::Raw);

    let masks = collect_all(&normalized_set, normalized)
        .into_iter()
        .chain(collect_all(&raw_set, raw));

    let mut pool = Vec::new();
    for (strategy, mask) in masks {
        let closed = close_square(&mask, params.close_iterations);
        let mut kept = 0usize;
        for contour in external_contours(&closed) {
            match check_candidate(&contour, canvas_area, params) {
                Ok(()) => {
                    pool.push(contour);
                    kept += 1;
                }
                Err(Rejection::TooSmall { .. }) => {}
                Err(reason) => log::debug!("{strategy}: candidate rejected ({reason:?})"),
            }
        }
        log::debug!("{strategy}: {kept} candidates");
    }

    if pool.is_empty() {
        return Err(ObjectDetectError::no_objects());
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_canvas::{mask_contour, Canvas};
    use approx::assert_relative_eq;

    #[test]
    fn filters_reject_noise_slivers_and_merged_blobs() {
        let params = ObjectParams::default();
        let canvas_area = 400.0 * 566.0;

        let speck = mask_contour(|x, y| (10..25).contains(&x) && (10..25).contains(&y));
        assert!(matches!(
            check_candidate(&speck, canvas_area, &params),
            Err(Rejection::TooSmall { .. })
        ));

        let sliver = mask_contour(|x, y| (10..210).contains(&x) && (50..60).contains(&y));
        assert!(matches!(
            check_candidate(&sliver, canvas_area, &params),
            Err(Rejection::Sliver { height: 10, .. })
        ));

        // Two bars touching at one end form an L: hull far exceeds the area.
        let merged = mask_contour(|x, y| {
            ((20..200).contains(&x) && (20..40).contains(&y))
                || ((20..40).contains(&x) && (20..200).contains(&y))
        });
        match check_candidate(&merged, canvas_area, &params) {
            Err(Rejection::Concave { ratio }) => assert!(ratio > 1.8),
            other => panic!("expected concave rejection, got {other:?}"),
        }

        let card = mask_contour(|x, y| (50..150).contains(&x) && (60..120).contains(&y));
        assert_eq!(check_candidate(&card, canvas_area, &params), Ok(()));
        assert_relative_eq!(card.area(), 99.0 * 59.0);
    }

    #[test]
    fn full_sheet_outline_is_too_large() {
        let params = ObjectParams::default();
        let frame = mask_contour(|x, y| (2..398).contains(&x) && (2..298).contains(&y));
        assert!(matches!(
            check_candidate(&frame, 400.0 * 300.0, &params),
            Err(Rejection::TooLarge { .. })
        ));
    }

    #[test]
    fn merged_blob_never_reaches_pool() {
        let mut canvas = Canvas::paper(400, 566);
        canvas.rect(180.0, 75.0, 240.0, 30.0, 0.0);
        canvas.rect(75.0, 180.0, 30.0, 240.0, 0.0);
        canvas.disc(280.0, 420.0, 50.0);
        let raw = canvas.gray();
        let params = ObjectParams::default();
        let pool = extract_candidates(&raw, &raw, &params).expect("disc found");
        assert!(pool.iter().all(|c| c.convexity_ratio() <= params.max_convexity));
        assert!(pool.iter().any(|c| {
            let p = c.centroid().expect("centroid");
            (p.x - 280.0).abs() < 5.0 && (p.y - 420.0).abs() < 5.0
        }));
    }

    #[test]
    fn blank_paper_has_no_candidates() {
        let raw = Canvas::paper(300, 400).gray();
        let err = extract_candidates(&raw, &raw, &ObjectParams::default()).unwrap_err();
        assert!(err.to_string().starts_with("no objects detected:"));
    }
}
