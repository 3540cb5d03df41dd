//! Object stage: find every object lying on a rectified reference sheet and
//! measure it in millimetres.
//!
//! The pipeline is shading correction, a multi-strategy candidate cascade,
//! centroid-distance deduplication and per-object shape measurement.
//!
//! ```no_run
//! use paperscale_objects::{measure_objects, ObjectParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let canvas = image::open("rectified.png")?.to_rgb8();
//! let report = measure_objects(&canvas, 0.2625, &ObjectParams::default())?;
//! for obj in &report.objects {
//!     println!("{} {:?}: {} x {} mm", obj.id, obj.shape_type, obj.width_mm, obj.height_mm);
//! }
//! # Ok(())
//! # }
//! ```

mod candidates;
mod dedup;
mod error;
mod expand;
mod illumination;
mod measure;
mod params;
mod types;

#[cfg(test)]
mod test_canvas;

pub use candidates::{check_candidate, extract_candidates, Rejection};
pub use dedup::suppress_duplicates;
pub use error::ObjectDetectError;
pub use expand::expand_contour;
pub use illumination::normalize_illumination;
pub use measure::measure_shape;
pub use params::{
    default_object_strategies, Channel, ChannelStrategy, IlluminationParams, ObjectParams,
    ShapeParams,
};
pub use types::{EllipseRender, MeasuredObject, ObjectReport, ShapeKind, ShapeMetrics};

use image::RgbImage;
use paperscale_core::to_gray;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detect and measure every object on a rectified canvas.
///
/// `scale` is millimetres per canvas pixel. Objects are numbered in the
/// order they survive deduplication, largest outline first.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(canvas, params), fields(width = canvas.width(), height = canvas.height()))
)]
pub fn measure_objects(
    canvas: &RgbImage,
    scale: f64,
    params: &ObjectParams,
) -> Result<ObjectReport, ObjectDetectError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ObjectDetectError::InvalidScale { scale });
    }
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return Err(ObjectDetectError::InvalidImage { width, height });
    }

    let gray = to_gray(canvas);
    let normalized = normalize_illumination(&gray, &params.illumination);
    let pool = extract_candidates(&normalized, &gray, params)?;
    let pooled = pool.len();
    let unique = suppress_duplicates(pool, params);
    log::info!("{} objects from {pooled} candidates", unique.len());

    let objects = unique
        .iter()
        .enumerate()
        .map(|(id, contour)| measure_shape(contour, id, scale, &gray, &params.shape))
        .collect();
    Ok(ObjectReport::new(objects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_canvas::Canvas;

    #[test]
    fn disc_and_card_are_found_and_measured() {
        let mut canvas = Canvas::paper(400, 566);
        canvas.disc(120.0, 150.0, 50.0);
        canvas.rect(250.0, 400.0, 160.0, 90.0, 10.0);
        let scale = 210.0 / 400.0;
        let report = measure_objects(&canvas.rgb(), scale, &ObjectParams::default()).expect("objects");

        assert_eq!(report.count, 2);
        assert_eq!(report.count, report.objects.len());
        assert_eq!(report.objects[0].id, 0);
        assert_eq!(report.objects[1].id, 1);

        // Largest outline first: the card.
        let card = &report.objects[0];
        assert_eq!(card.shape_type, ShapeKind::Polygon);
        assert!((card.centroid[0] - 250.0).abs() < 3.0 && (card.centroid[1] - 400.0).abs() < 3.0);

        let disc = &report.objects[1];
        assert_eq!(disc.shape_type, ShapeKind::Circle);
        let expected = 100.0 * scale;
        assert!(
            (disc.width_mm - expected).abs() < 0.02 * expected,
            "diameter {} vs {expected}",
            disc.width_mm
        );
    }

    #[test]
    fn disc_diameter_holds_across_sizes_on_full_canvas() {
        let params = ObjectParams::default();
        let scale = 210.0 / 800.0;
        for radius in [20.0, 40.0, 80.0, 150.0] {
            let mut canvas = Canvas::paper(800, 1131);
            canvas.disc(400.0, 560.0, radius);
            let report = measure_objects(&canvas.rgb(), scale, &params).expect("objects");
            assert_eq!(report.count, 1, "r = {radius}");

            let disc = &report.objects[0];
            assert_eq!(disc.shape_type, ShapeKind::Circle, "r = {radius}");
            let expected = 2.0 * radius * scale;
            assert!(
                (disc.width_mm - expected).abs() <= 0.02 * expected,
                "r = {radius}: diameter {} vs {expected}",
                disc.width_mm
            );
        }
    }

    #[test]
    fn blank_sheet_reports_no_objects() {
        let canvas = Canvas::paper(300, 420).rgb();
        let err = measure_objects(&canvas, 0.5, &ObjectParams::default()).unwrap_err();
        assert!(matches!(err, ObjectDetectError::NoObjects { .. }));
    }

    #[test]
    fn rejects_bad_scale_and_empty_canvas() {
        let canvas = Canvas::paper(50, 50).rgb();
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                measure_objects(&canvas, scale, &ObjectParams::default()),
                Err(ObjectDetectError::InvalidScale { .. })
            ));
        }
        assert_eq!(
            measure_objects(&RgbImage::new(0, 10), 0.5, &ObjectParams::default()).unwrap_err(),
            ObjectDetectError::InvalidImage { width: 0, height: 10 }
        );
    }
}
