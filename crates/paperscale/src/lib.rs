//! Measure real-world objects in a photo, using a sheet of paper of known
//! size (A4 by default) as the scale reference.
//!
//! This crate provides:
//! - re-exports of the stage crates (`core`, `sheet`, `objects`)
//! - end-to-end helpers from a decoded photo to measured objects
//! - manual distance and area tools on picked canvas points
//! - a calibration record, a pluggable session store and the calibrate /
//!   auto-measure / upload-measure workflows built on it
//!
//! ## Quickstart
//!
//! ```no_run
//! use paperscale::{measure_photo, MeasureConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = image::open("desk.jpg")?.to_rgb8();
//! let (calibration, report) = measure_photo(&photo, &MeasureConfig::default())?;
//! println!("{:.4} mm/px, {} objects", calibration.scale_mm_per_px, report.count);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `paperscale::core`: geometry, filters, strategy cascade, contours.
//! - `paperscale::sheet`: reference sheet location and rectification.
//! - `paperscale::objects`: object detection and shape measurement.
//! - `paperscale::workflow`: session-level flows over a [`SessionStore`].

pub use paperscale_core as core;
pub use paperscale_objects as objects;
pub use paperscale_sheet as sheet;

mod calibration;
mod config;
mod detect;
mod error;
mod manual;
mod session;
pub mod workflow;

pub use calibration::CalibrationRecord;
pub use config::{ConfigError, MeasureConfig};
pub use detect::{detect_reference_plane, measure_photo};
pub use error::{InputError, MeasureError};
pub use manual::{measure_distance, measure_polygon_area};
pub use session::{InMemorySessionStore, SessionStore};

pub use paperscale_objects::{measure_objects, MeasuredObject, ObjectParams, ObjectReport, ShapeKind};
pub use paperscale_sheet::{SheetParams, SheetSize};
