/// Failures of the object stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ObjectDetectError {
    #[error("no objects detected: {reason}")]
    NoObjects { reason: String },

    #[error("invalid scale {scale} mm/px (must be finite and positive)")]
    InvalidScale { scale: f64 },

    #[error("invalid canvas dimensions (width={width}, height={height})")]
    InvalidImage { width: u32, height: u32 },
}

impl ObjectDetectError {
    pub(crate) fn no_objects() -> Self {
        ObjectDetectError::NoObjects {
            reason: "no outline inside the sheet passed the size and shape checks; make sure \
                     objects have clear edges and contrast against the paper"
                .to_string(),
        }
    }
}
