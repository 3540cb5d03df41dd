//! Image preprocessing building blocks.
//!
//! Smoothing, edge detection and morphology go through `imageproc`. CLAHE,
//! the adaptive Gaussian threshold and background division have no
//! `imageproc` counterpart. The bilateral filter is local as well:
//! `imageproc::filter::bilateral_filter` works on a square window, scales
//! colour distances by the image maximum and panics on empty input, while the
//! cascade wants a disc neighbourhood with `sigma_color` in grey levels.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

/// Sigma conventionally derived for a `k x k` Gaussian kernel when none is given.
#[inline]
pub fn gaussian_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian with exactly `kernel` taps (rounded up to odd).
pub fn gaussian_kernel(kernel: u32) -> Vec<f32> {
    let k = kernel.max(1) | 1;
    let sigma = gaussian_sigma(k).max(0.1);
    let radius = (k / 2) as i32;
    let coeff = -0.5 / (sigma * sigma);
    let mut taps: Vec<f32> = (-radius..=radius)
        .map(|i| ((i * i) as f32 * coeff).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.iter_mut().for_each(|t| *t /= sum);
    taps
}

/// Gaussian smoothing over the full `kernel x kernel` window. Kernels of 1
/// or less are the identity.
///
/// `imageproc::filter::gaussian_blur_f32` cuts its kernel at `2 * sigma`,
/// far short of wide windows such as the 61-tap background estimate.
pub fn gaussian_blur(img: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    imageproc::filter::separable_filter_equal(img, &gaussian_kernel(kernel))
}

/// Binary Canny edge map (edges are 255).
pub fn canny(img: &GrayImage, low: f32, high: f32) -> GrayImage {
    imageproc::edges::canny(img, low.min(high), high.max(low))
}

/// Edge-preserving bilateral filter over a disc of diameter `diameter`.
pub fn bilateral(img: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let radius = (diameter / 2).max(1) as i32;
    let (w, h) = img.dimensions();
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let color_lut: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();
    let mut taps: Vec<(i32, i32, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = dx * dx + dy * dy;
            if r2 <= radius * radius {
                taps.push((dx, dy, (r2 as f32 * space_coeff).exp()));
            }
        }
    }

    let at = |x: i32, y: i32| -> u8 {
        let cx = x.clamp(0, w as i32 - 1) as u32;
        let cy = y.clamp(0, h as i32 - 1) as u32;
        img.get_pixel(cx, cy)[0]
    };

    GrayImage::from_fn(w, h, |x, y| {
        let center = img.get_pixel(x, y)[0];
        let mut acc = 0.0f32;
        let mut norm = 0.0f32;
        for &(dx, dy, ws) in &taps {
            let v = at(x as i32 + dx, y as i32 + dy);
            let wgt = ws * color_lut[(v as i32 - center as i32).unsigned_abs() as usize];
            acc += wgt * v as f32;
            norm += wgt;
        }
        Luma([(acc / norm).round().clamp(0.0, 255.0) as u8])
    })
}

/// Inverted adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it is at least `c` levels darker than its
/// `block_size` neighbourhood, so dark objects on paper come out white.
pub fn adaptive_threshold_inv(img: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let mean = gaussian_blur(img, block_size.max(3) | 1);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y)[0] as f32;
        let m = mean.get_pixel(x, y)[0] as f32;
        Luma([if v - m > -c { 0 } else { 255 }])
    })
}

/// Global Otsu binarization (bright regions are 255).
pub fn otsu_binary(img: &GrayImage) -> GrayImage {
    let level = imageproc::contrast::otsu_level(img);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([if img.get_pixel(x, y)[0] > level { 255 } else { 0 }])
    })
}

/// Morphological closing with a 3x3 square element, `iterations` times.
pub fn close_square(mask: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return mask.clone();
    }
    imageproc::morphology::close(mask, Norm::LInf, iterations)
}

/// Dilate a binary mask by a disc of radius `radius`.
pub fn dilate_disc(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    imageproc::morphology::dilate(mask, Norm::L2, radius)
}

/// Flat-field correction: `src * 255 / blur(src)`, saturated.
pub fn divide_by_background(img: &GrayImage, kernel: u32) -> GrayImage {
    let background = gaussian_blur(img, kernel);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let b = background.get_pixel(x, y)[0] as f32;
        if b <= 0.0 {
            return Luma([0]);
        }
        let v = img.get_pixel(x, y)[0] as f32 * 255.0 / b;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Contrast-limited adaptive histogram equalization on a `tiles x tiles`
/// grid with bilinear blending between neighbouring tile mappings.
pub fn clahe(img: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let tiles_x = tiles.clamp(1, w);
    let tiles_y = tiles.clamp(1, h);
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let count = (x1.saturating_sub(x0) * y1.saturating_sub(y0)).max(1);
            luts[(ty * tiles_x + tx) as usize] = clipped_equalization(&mut hist, count, clip_limit);
        }
    }

    // Tile centres sit at (t + 0.5) * tile size.
    let locate = |p: u32, size: u32, n: u32| -> (usize, usize, f32) {
        let f = (p as f32 + 0.5) / size as f32 - 0.5;
        let lo = f.floor();
        let t = f - lo;
        let a = (lo as i64).clamp(0, n as i64 - 1) as usize;
        let b = (lo as i64 + 1).clamp(0, n as i64 - 1) as usize;
        (a, b, t)
    };

    GrayImage::from_fn(w, h, |x, y| {
        let v = img.get_pixel(x, y)[0] as usize;
        let (xa, xb, fx) = locate(x, tile_w, tiles_x);
        let (ya, yb, fy) = locate(y, tile_h, tiles_y);
        let lut = |tx: usize, ty: usize| luts[ty * tiles_x as usize + tx][v] as f32;
        let top = lut(xa, ya) * (1.0 - fx) + lut(xb, ya) * fx;
        let bottom = lut(xa, yb) * (1.0 - fx) + lut(xb, yb) * fx;
        Luma([(top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8])
    })
}

fn clipped_equalization(hist: &mut [u32; 256], count: u32, clip_limit: f32) -> [u8; 256] {
    if clip_limit > 0.0 {
        let limit = ((clip_limit * count as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }
        let batch = excess / 256;
        let residual = (excess % 256) as usize;
        for bin in hist.iter_mut() {
            *bin += batch;
        }
        if residual > 0 {
            let step = (256 / residual).max(1);
            for bin in hist.iter_mut().step_by(step).take(residual) {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / count as f32;
    let mut lut = [0u8; 256];
    let mut acc = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        acc += bin;
        lut[i] = (acc as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
