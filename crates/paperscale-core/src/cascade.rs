//! Preprocessing strategies that turn a grayscale image into an edge or
//! region mask.
//!
//! A cascade is an ordered list of [`Strategy`] values. A strategy that
//! panics inside a filter is logged and skipped so one bad recipe never
//! aborts the whole cascade.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::filters::{adaptive_threshold_inv, bilateral, canny, gaussian_blur, otsu_binary};

/// One preprocessing recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Gaussian blur with a `kernel x kernel` window, then Canny.
    GaussianCanny { kernel: u32, low: f32, high: f32 },
    /// Bilateral smoothing, then Canny.
    BilateralCanny {
        diameter: u32,
        sigma_color: f32,
        sigma_space: f32,
        low: f32,
        high: f32,
    },
    /// Gaussian blur, then inverted adaptive Gaussian threshold.
    AdaptiveThreshold {
        blur_kernel: u32,
        block_size: u32,
        c: f32,
    },
    /// Gaussian blur, then global Otsu binarization.
    Otsu { blur_kernel: u32 },
}

impl Strategy {
    pub const fn canny(kernel: u32, low: f32, high: f32) -> Self {
        Strategy::GaussianCanny { kernel, low, high }
    }

    pub const fn bilateral_canny(low: f32, high: f32) -> Self {
        Strategy::BilateralCanny {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
            low,
            high,
        }
    }

    fn apply(&self, gray: &GrayImage) -> GrayImage {
        match *self {
            Strategy::GaussianCanny { kernel, low, high } => canny(&gaussian_blur(gray, kernel), low, high),
            Strategy::BilateralCanny {
                diameter,
                sigma_color,
                sigma_space,
                low,
                high,
            } => canny(&bilateral(gray, diameter, sigma_color, sigma_space), low, high),
            Strategy::AdaptiveThreshold {
                blur_kernel,
                block_size,
                c,
            } => adaptive_threshold_inv(&gaussian_blur(gray, blur_kernel), block_size, c),
            Strategy::Otsu { blur_kernel } => otsu_binary(&gaussian_blur(gray, blur_kernel)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::GaussianCanny { kernel, low, high } => {
                write!(f, "gaussian{kernel}+canny({low}/{high})")
            }
            Strategy::BilateralCanny { diameter, low, high, .. } => {
                write!(f, "bilateral{diameter}+canny({low}/{high})")
            }
            Strategy::AdaptiveThreshold {
                blur_kernel,
                block_size,
                c,
            } => write!(f, "gaussian{blur_kernel}+adaptive({block_size},{c})"),
            Strategy::Otsu { blur_kernel } => write!(f, "gaussian{blur_kernel}+otsu"),
        }
    }
}

/// Run one strategy, turning a panic into `None`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(gray), fields(strategy = %strategy))
)]
pub fn run_strategy(strategy: &Strategy, gray: &GrayImage) -> Option<GrayImage> {
    if gray.width() == 0 || gray.height() == 0 {
        return None;
    }
    match catch_unwind(AssertUnwindSafe(|| strategy.apply(gray))) {
        Ok(mask) => Some(mask),
        Err(_) => {
            log::warn!("strategy {strategy} failed, skipping");
            None
        }
    }
}

/// Walk the cascade in order and return the first result `accept` keeps.
pub fn first_success<T, F>(strategies: &[Strategy], gray: &GrayImage, mut accept: F) -> Option<T>
where
    F: FnMut(&Strategy, GrayImage) -> Option<T>,
{
    for strategy in strategies {
        let Some(mask) = run_strategy(strategy, gray) else {
            continue;
        };
        if let Some(found) = accept(strategy, mask) {
            log::debug!("strategy {strategy} accepted");
            return Some(found);
        }
        log::debug!("strategy {strategy} produced no acceptable result");
    }
    None
}

/// Run every strategy and pool the masks that were produced.
pub fn collect_all<'a>(strategies: &'a [Strategy], gray: &GrayImage) -> Vec<(&'a Strategy, GrayImage)> {
    strategies
        .iter()
        .filter_map(|s| run_strategy(s, gray).map(|mask| (s, mask)))
        .collect()
}
