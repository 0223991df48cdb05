// SPDX-License-Identifier: MPL-2.0

//! Smoothing, sharpening and intensity filters

use super::{OperationOutput, Panel};
use crate::constants::{adjust, ops};
use crate::errors::AppResult;
use crate::media::Frame;
use crate::media::kernel::{self, Plane};
use crate::pipelines::adjust::steps::blend_with_blur;
use image::{GrayImage, RgbImage};

/// `log(1 + v)` stretched to the full 8-bit range
pub fn log_transform(gray: &GrayImage) -> GrayImage {
    let logs: Vec<f32> = gray.iter().map(|&v| (v as f32).ln_1p()).collect();
    let min = logs.iter().copied().fold(f32::MAX, f32::min);
    let max = logs.iter().copied().fold(f32::MIN, f32::max);
    let range = max - min;
    let data = logs
        .iter()
        .map(|&l| {
            if range > 0.0 {
                ((l - min) / range * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();
    GrayImage::from_raw(gray.width(), gray.height(), data)
        .unwrap_or_else(|| GrayImage::new(gray.width(), gray.height()))
}

/// Gaussian blur with an odd kernel size and the sigma that size implies
pub fn gaussian_blur(image: &RgbImage, ksize: u32) -> RgbImage {
    let ksize = ksize.clamp(ops::BLUR_KSIZE_MIN, ops::BLUR_KSIZE_MAX) | 1;
    kernel::gaussian_blur(image, ksize, 0.0)
}

pub fn median(image: &RgbImage) -> RgbImage {
    let radius = ops::MEDIAN_KSIZE / 2;
    imageproc::filter::median_filter(image, radius, radius)
}

/// Normalised box filter
pub fn averaging(image: &RgbImage) -> RgbImage {
    let k = ops::AVERAGE_KSIZE as usize;
    let weights = vec![1.0 / (k * k) as f32; k * k];
    kernel::correlate_rgb(image, &weights, k, k)
}

/// `(1 + a) * src - a * blur` with `a = amount / 10`
pub fn sharpen(image: &RgbImage, amount: u32) -> RgbImage {
    let a = amount.min(ops::SHARPEN_AMOUNT_MAX) as f32 / 10.0;
    blend_with_blur(image, 1.0 + a, -a, adjust::SHARPEN_SIGMA)
}

const DIFFERENCE_KERNEL: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];

/// Horizontal and vertical difference kernels, negative responses clipped
pub fn difference(gray: &GrayImage) -> (GrayImage, GrayImage) {
    let plane = Plane::from_gray(gray);
    let transposed: Vec<f32> = (0..9).map(|i| DIFFERENCE_KERNEL[(i % 3) * 3 + i / 3]).collect();
    let horizontal = kernel::correlate(&plane, &DIFFERENCE_KERNEL, 3, 3).to_gray();
    let vertical = kernel::correlate(&plane, &transposed, 3, 3).to_gray();
    (horizontal, vertical)
}

pub(super) fn difference_panels(input: &Frame) -> AppResult<OperationOutput> {
    let (horizontal, vertical) = difference(&input.to_gray());
    Ok(OperationOutput::Panels {
        panels: vec![
            Panel::new("Original", input.clone()),
            Panel::new("Horizontal", Frame::gray(horizontal)?),
            Panel::new("Vertical", Frame::gray(vertical)?),
        ],
        note: None,
    })
}

/// Flat gray image helper for tests in sibling modules
#[cfg(test)]
pub(crate) fn flat_gray(w: u32, h: u32, v: u8) -> GrayImage {
    GrayImage::from_pixel(w, h, image::Luma([v]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_log_transform_stretches_range() {
        let mut gray = flat_gray(3, 1, 0);
        gray.put_pixel(1, 0, Luma([15]));
        gray.put_pixel(2, 0, Luma([255]));
        let out = log_transform(&gray);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(2, 0).0[0], 255);
        // ln(16) / ln(256) = 0.5
        let mid = out.get_pixel(1, 0).0[0];
        assert!((127..=128).contains(&mid), "got {}", mid);
    }

    #[test]
    fn test_log_transform_of_flat_image_is_black() {
        let out = log_transform(&flat_gray(4, 4, 90));
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_smoothing_keeps_flat_images() {
        let image = RgbImage::from_pixel(9, 7, Rgb([40, 120, 220]));
        assert_eq!(gaussian_blur(&image, 7), image);
        assert_eq!(averaging(&image), image);
        assert_eq!(median(&image), image);
        assert_eq!(sharpen(&image, 30), image);
    }

    #[test]
    fn test_median_removes_salt_noise() {
        let mut image = RgbImage::from_pixel(9, 9, Rgb([10, 10, 10]));
        image.put_pixel(4, 4, Rgb([255, 255, 255]));
        assert_eq!(median(&image).get_pixel(4, 4).0, [10, 10, 10]);
    }

    #[test]
    fn test_difference_responds_to_horizontal_edge() {
        let gray = GrayImage::from_fn(6, 6, |_, y| Luma([if y < 3 { 0 } else { 100 }]));
        let (horizontal, vertical) = difference(&gray);
        assert_eq!(horizontal.get_pixel(2, 2).0[0], 255);
        assert_eq!(horizontal.get_pixel(2, 0).0[0], 0);
        assert!(vertical.iter().all(|&v| v == 0));
    }
}
