use paperscale_objects::ObjectDetectError;
use paperscale_sheet::SheetDetectError;

/// Caller mistakes: missing calibration or malformed point input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("session {session:?} is not calibrated; detect the reference sheet first")]
    NotCalibrated { session: String },

    #[error("expected exactly {expected} points, got {got}")]
    WrongPointCount { expected: usize, got: usize },

    #[error("at least {needed} points are required, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint { index: usize },

    #[error("invalid scale {scale} mm/px (must be finite and positive)")]
    InvalidScale { scale: f64 },
}

/// Any failure of a measurement workflow.
#[derive(thiserror::Error, Debug)]
pub enum MeasureError {
    #[error(transparent)]
    Sheet(#[from] SheetDetectError),

    #[error(transparent)]
    Objects(#[from] ObjectDetectError),

    #[error(transparent)]
    Input(#[from] InputError),
}

impl MeasureError {
    /// The sheet or the objects were not found; retaking the photo may help.
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            MeasureError::Sheet(SheetDetectError::NotDetected { .. } | SheetDetectError::HomographyFailed)
                | MeasureError::Objects(ObjectDetectError::NoObjects { .. })
        )
    }

    /// The request itself was invalid.
    pub fn is_input_failure(&self) -> bool {
        matches!(
            self,
            MeasureError::Input(_)
                | MeasureError::Sheet(SheetDetectError::InvalidImage { .. })
                | MeasureError::Objects(
                    ObjectDetectError::InvalidScale { .. } | ObjectDetectError::InvalidImage { .. }
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_separates_detection_from_input() {
        let sheet: MeasureError = SheetDetectError::NotDetected {
            reason: "dark".to_string(),
        }
        .into();
        assert!(sheet.is_detection_failure() && !sheet.is_input_failure());
        assert_eq!(sheet.to_string(), "reference sheet not detected: dark");

        let input: MeasureError = InputError::NotCalibrated {
            session: "s1".to_string(),
        }
        .into();
        assert!(input.is_input_failure() && !input.is_detection_failure());

        let scale: MeasureError = ObjectDetectError::InvalidScale { scale: 0.0 }.into();
        assert!(scale.is_input_failure());
    }
}
