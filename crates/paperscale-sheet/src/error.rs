/// Failures of the reference-sheet stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SheetDetectError {
    #[error("reference sheet not detected: {reason}")]
    NotDetected { reason: String },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidImage { width: u32, height: u32 },

    #[error("perspective transform is singular for the located corners")]
    HomographyFailed,
}

impl SheetDetectError {
    pub(crate) fn not_detected() -> Self {
        SheetDetectError::NotDetected {
            reason: "ensure the full sheet is visible, well lit and clearly distinct from the \
                     background; objects on the sheet must not cover its edges"
                .to_string(),
        }
    }
}
