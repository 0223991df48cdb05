// SPDX-License-Identifier: MPL-2.0

//! Individual live adjustment steps
//!
//! Each step is a pure function on an 8-bit RGB image. Arithmetic is done in
//! floating point and saturated back to `0..=255` with rounding.

use crate::constants::adjust;
use crate::media::kernel;
use image::{GrayImage, RgbImage};

#[inline]
fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Scale every channel by `(100 + contrast) / 100`
pub fn apply_contrast(image: &mut RgbImage, contrast: i32) {
    let factor = (100.0 + contrast as f32) / 100.0;
    for value in image.iter_mut() {
        *value = saturate(*value as f32 * factor);
    }
}

/// Add `exposure` to every channel
pub fn apply_exposure(image: &mut RgbImage, exposure: i32) {
    for value in image.iter_mut() {
        *value = (*value as i32 + exposure).clamp(0, 255) as u8;
    }
}

/// Unsharp mask: `alpha * src + (1 - alpha) * blur` with
/// `alpha = 1 + amount / 100 * 1.5`
pub fn apply_sharpen(image: &RgbImage, amount: u32) -> RgbImage {
    let alpha = 1.0 + (amount as f32 / 100.0) * adjust::SHARPEN_GAIN;
    blend_with_blur(image, alpha, 1.0 - alpha, adjust::SHARPEN_SIGMA)
}

/// `src_weight * src + blur_weight * gaussian(src, sigma)`, saturated
pub fn blend_with_blur(image: &RgbImage, src_weight: f32, blur_weight: f32, sigma: f32) -> RgbImage {
    let blurred = kernel::gaussian_planes(image, kernel::ksize_for_sigma(sigma), sigma);
    let mut out = image.clone();
    for (i, pixel) in out.pixels_mut().enumerate() {
        for (c, value) in pixel.0.iter_mut().enumerate() {
            *value = saturate(*value as f32 * src_weight + blurred[c].data[i] * blur_weight);
        }
    }
    out
}

/// Mirror around the vertical axis
pub fn apply_flip(image: &mut RgbImage) {
    image::imageops::flip_horizontal_in_place(image);
}

/// Binary edge map of the live edge effect (values 0 or 255)
pub fn edge_map(gray: &GrayImage) -> GrayImage {
    imageproc::edges::canny(gray, adjust::EDGE_LOW, adjust::EDGE_HIGH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_contrast_scales_and_saturates() {
        let mut img = RgbImage::from_pixel(1, 1, Rgb([100, 200, 10]));
        apply_contrast(&mut img, 50);
        assert_eq!(img.get_pixel(0, 0).0, [150, 255, 15]);

        let mut img = RgbImage::from_pixel(1, 1, Rgb([100, 200, 10]));
        apply_contrast(&mut img, -100);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_exposure_offsets_all_channels() {
        let mut img = RgbImage::from_pixel(1, 1, Rgb([10, 250, 128]));
        apply_exposure(&mut img, 20);
        assert_eq!(img.get_pixel(0, 0).0, [30, 255, 148]);
        apply_exposure(&mut img, -40);
        assert_eq!(img.get_pixel(0, 0).0, [0, 215, 108]);
    }

    #[test]
    fn test_sharpen_keeps_flat_regions() {
        let img = RgbImage::from_pixel(8, 8, Rgb([90, 90, 90]));
        assert_eq!(apply_sharpen(&img, 100), img);
    }

    #[test]
    fn test_flip_moves_columns() {
        let mut img = RgbImage::from_fn(3, 1, |x, _| Rgb([x as u8, 0, 0]));
        apply_flip(&mut img);
        assert_eq!(img.get_pixel(0, 0).0[0], 2);
        assert_eq!(img.get_pixel(2, 0).0[0], 0);
    }
}
