// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization — grayscale conversion, Gaussian smoothing, and adaptive
// thresholding with inverted polarity (ink is foreground).

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use sudokuscan_core::config::BinarizeConfig;
use tracing::{debug, info, instrument};

/// Foreground value in every binary image produced by this crate.
pub const INK: u8 = 255;

/// Background value in every binary image produced by this crate.
pub const PAPER: u8 = 0;

/// Gaussian sigma for a `k × k` kernel, using OpenCV's rule for sigma = 0.
pub fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Convert a photograph into a binary image where ink and grid lines are
/// [`INK`] and paper is [`PAPER`].
///
/// Accepts colour or grayscale input. The input is never modified.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn binarize(image: &DynamicImage, config: &BinarizeConfig) -> GrayImage {
    let gray = image.to_luma8();
    binarize_gray(&gray, config)
}

/// [`binarize`] for an image that is already grayscale.
pub fn binarize_gray(gray: &GrayImage, config: &BinarizeConfig) -> GrayImage {
    info!(
        blur_kernel = config.blur_kernel,
        block_size = config.block_size,
        offset = config.offset,
        "Binarizing photograph"
    );

    let blurred = gaussian_blur_f32(gray, kernel_sigma(config.blur_kernel));
    let binary = adaptive_gaussian_threshold(&blurred, config.block_size, config.offset);

    debug!(
        ink_pixels = count_ink(&binary),
        "Binarization complete"
    );
    binary
}

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes [`INK`] when it is at least `offset` darker than the
/// Gaussian-weighted mean of its `block_size` neighbourhood.
pub fn adaptive_gaussian_threshold(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let local = gaussian_blur_f32(gray, kernel_sigma(block_size));
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y).0[0];
        let mean = local.get_pixel(x, y).0[0];
        ink_if(pixel, f64::from(mean), offset)
    })
}

/// Adaptive threshold against the plain mean of the `block_size` box around
/// each pixel, computed from a summed-area table.
pub fn adaptive_mean_threshold(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let sums = integral_image::<_, u64>(gray);
    let radius = block_size / 2;
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y).0[0];
        ink_if(pixel, window_mean(&sums, x, y, radius), offset)
    })
}

/// Number of foreground pixels in a binary image.
pub fn count_ink(binary: &GrayImage) -> u32 {
    binary.pixels().filter(|p| p.0[0] != PAPER).count() as u32
}

fn ink_if(pixel: u8, local_mean: f64, offset: f32) -> Luma<u8> {
    if f64::from(pixel) <= local_mean - f64::from(offset) {
        Luma([INK])
    } else {
        Luma([PAPER])
    }
}

// -- Box means ----------------------------------------------------------------

type SummedArea = ImageBuffer<Luma<u64>, Vec<u64>>;

/// Mean intensity of the `(2r + 1)²` box centred on `(x, y)`. Near the border
/// the box is cut to the part inside the image and only those pixels count.
///
/// `sums` is one pixel larger than the source on each axis, so `(x, y)` must
/// lie inside the source.
fn window_mean(sums: &SummedArea, x: u32, y: u32, radius: u32) -> f64 {
    let last_col = sums.width() - 2;
    let last_row = sums.height() - 2;
    let (left, top) = (x.saturating_sub(radius), y.saturating_sub(radius));
    let right = x.saturating_add(radius).min(last_col);
    let bottom = y.saturating_add(radius).min(last_row);

    let pixels = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    let [total] = sum_image_pixels(sums, left, top, right, bottom);
    total as f64 / pixels as f64
}
