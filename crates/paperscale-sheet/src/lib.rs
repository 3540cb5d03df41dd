//! Reference-sheet stage: find a known-size sheet of paper in a photo and
//! rectify it into a fronto-parallel canvas with a fixed mm-per-pixel scale.
//!
//! ```no_run
//! use paperscale_sheet::{detect_sheet, SheetParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = image::open("desk.jpg")?.to_rgb8();
//! let sheet = detect_sheet(&photo, &SheetParams::default())?;
//! println!("{:.4} mm/px", sheet.scale_mm_per_px);
//! # Ok(())
//! # }
//! ```

mod error;
mod locator;
mod params;
mod rectify;

#[cfg(test)]
mod test_scene;

pub use error::SheetDetectError;
pub use locator::{locate_sheet, SheetQuad};
pub use params::{default_sheet_strategies, SheetParams, SheetSize};
pub use rectify::{detect_sheet, rectify, RectifiedSheet};
