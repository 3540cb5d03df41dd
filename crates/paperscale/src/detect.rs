use image::RgbImage;
use paperscale_objects::ObjectReport;
use paperscale_sheet::{detect_sheet, SheetDetectError, SheetParams};

use crate::calibration::CalibrationRecord;
use crate::config::MeasureConfig;
use crate::error::MeasureError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Find the reference sheet in `image` and rectify it.
pub fn detect_reference_plane(
    image: &RgbImage,
    params: &SheetParams,
) -> Result<CalibrationRecord, SheetDetectError> {
    let sheet = detect_sheet(image, params)?;
    log::info!(
        "sheet found by {} ({} corners refined), {:.4} mm/px",
        sheet.quad.strategy,
        sheet.quad.refined_corners,
        sheet.scale_mm_per_px
    );
    Ok(sheet.into())
}

/// Detect the sheet in a photo, then measure every object on it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, config), fields(width = image.width(), height = image.height()))
)]
pub fn measure_photo(
    image: &RgbImage,
    config: &MeasureConfig,
) -> Result<(CalibrationRecord, ObjectReport), MeasureError> {
    let record = detect_reference_plane(image, &config.sheet)?;
    let report = paperscale_objects::measure_objects(&record.canvas, record.scale_mm_per_px, &config.objects)?;
    Ok((record, report))
}
