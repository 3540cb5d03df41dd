//! Session-level flows: calibrate once, then measure by detection or by
//! picked points against the stored scale.

use image::RgbImage;
use paperscale_objects::{measure_objects, MeasuredObject, ObjectReport};
use paperscale_sheet::SheetParams;
use serde::Serialize;

use crate::calibration::CalibrationRecord;
use crate::config::MeasureConfig;
use crate::detect::detect_reference_plane;
use crate::error::{InputError, MeasureError};
use crate::manual::{measure_distance, measure_polygon_area};
use crate::session::SessionStore;

/// Objects measured on one canvas plus the context needed to overlay them.
#[derive(Clone, Debug, Serialize)]
pub struct AutoMeasureReport {
    pub objects: Vec<MeasuredObject>,
    pub count: usize,
    /// Object highlighted first by clients.
    pub selected_id: usize,
    pub scale_mm_per_px: f64,
    /// Canvas the outlines refer to.
    #[serde(skip)]
    pub canvas: RgbImage,
    /// False when the stored calibration canvas was used instead of the
    /// new photo.
    pub used_fresh_detection: bool,
}

impl AutoMeasureReport {
    fn new(report: ObjectReport, canvas: RgbImage, scale_mm_per_px: f64, fresh: bool) -> Self {
        Self {
            objects: report.objects,
            count: report.count,
            selected_id: 0,
            scale_mm_per_px,
            canvas,
            used_fresh_detection: fresh,
        }
    }
}

fn stored(store: &dyn SessionStore, session: &str) -> Result<CalibrationRecord, InputError> {
    store.get(session).ok_or_else(|| InputError::NotCalibrated {
        session: session.to_string(),
    })
}

/// Detect and rectify the sheet, then store the result for `session`.
pub fn calibrate(
    store: &dyn SessionStore,
    session: &str,
    image: &RgbImage,
    config: &MeasureConfig,
) -> Result<CalibrationRecord, MeasureError> {
    let record = detect_reference_plane(image, &config.sheet)?;
    store.set(session, record.clone());
    Ok(record)
}

/// Measure objects in a new photo of a calibrated session.
///
/// The sheet is looked for again in `image`; if it cannot be found (camera
/// moved, sheet partly covered) the stored canvas and scale are used instead.
/// The stored calibration is left untouched either way.
pub fn auto_measure(
    store: &dyn SessionStore,
    session: &str,
    image: &RgbImage,
    config: &MeasureConfig,
) -> Result<AutoMeasureReport, MeasureError> {
    let record = stored(store, session)?;
    let (record, fresh) = match detect_reference_plane(image, &config.sheet) {
        Ok(fresh) => (fresh, true),
        Err(err) => {
            log::info!("session {session}: {err}; measuring the calibration canvas");
            (record, false)
        }
    };
    let report = measure_objects(&record.canvas, record.scale_mm_per_px, &config.objects)?;
    Ok(AutoMeasureReport::new(report, record.canvas, record.scale_mm_per_px, fresh))
}

/// Calibrate on an uploaded photo and measure the objects on it in one go.
///
/// A missing sheet is a hard failure here. The new calibration is stored
/// before measuring so manual tools work on the same canvas.
pub fn upload_measure(
    store: &dyn SessionStore,
    session: &str,
    image: &RgbImage,
    config: &MeasureConfig,
) -> Result<AutoMeasureReport, MeasureError> {
    let record = calibrate(store, session, image, config)?;
    let report = measure_objects(&record.canvas, record.scale_mm_per_px, &config.objects)?;
    Ok(AutoMeasureReport::new(report, record.canvas, record.scale_mm_per_px, true))
}

/// Distance in millimetres between two points on the session canvas.
pub fn manual_distance(
    store: &dyn SessionStore,
    session: &str,
    points: &[[f64; 2]],
) -> Result<f64, InputError> {
    let record = stored(store, session)?;
    measure_distance(points, record.scale_mm_per_px)
}

/// Area in square millimetres of a polygon on the session canvas.
pub fn manual_area(
    store: &dyn SessionStore,
    session: &str,
    points: &[[f64; 2]],
) -> Result<f64, InputError> {
    let record = stored(store, session)?;
    measure_polygon_area(points, record.scale_mm_per_px)
}

/// Canvas size clients should scale picked coordinates to.
pub fn canvas_dimensions(params: &SheetParams) -> (u32, u32) {
    params.canvas_size()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use paperscale_core::Homography;

    fn calibrated(scale: f64) -> InMemorySessionStore {
        let store = InMemorySessionStore::new();
        store.set(
            "s",
            CalibrationRecord {
                scale_mm_per_px: scale,
                canvas: RgbImage::new(10, 10),
                transform: Homography::identity(),
            },
        );
        store
    }

    #[test]
    fn manual_tools_use_the_stored_scale() {
        let store = calibrated(0.2625);
        assert_eq!(manual_distance(&store, "s", &[[0.0, 0.0], [100.0, 0.0]]), Ok(26.25));
        assert_eq!(
            manual_area(&store, "s", &[[0.0, 0.0], [100.0, 0.0], [100.0, 50.0], [0.0, 50.0]]),
            Ok(344.53)
        );
    }

    #[test]
    fn uncalibrated_session_is_an_input_failure() {
        let store = InMemorySessionStore::new();
        assert_eq!(
            manual_distance(&store, "x", &[[0.0, 0.0], [1.0, 0.0]]),
            Err(InputError::NotCalibrated {
                session: "x".to_string()
            })
        );
        let err = auto_measure(&store, "x", &RgbImage::new(4, 4), &MeasureConfig::default()).unwrap_err();
        assert!(err.is_input_failure());
    }

    #[test]
    fn canvas_follows_the_sheet_aspect() {
        assert_eq!(canvas_dimensions(&SheetParams::default()), (800, 1131));
    }
}
