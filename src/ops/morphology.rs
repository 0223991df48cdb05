// SPDX-License-Identifier: MPL-2.0

//! Binary morphology with square structuring elements

use super::{OperationOutput, Panel};
use crate::constants::ops;
use crate::errors::AppResult;
use crate::media::Frame;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode, open};

/// `v > threshold` → 255, else 0
pub fn binary(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y).0[0] > threshold { 255 } else { 0 }])
    })
}

/// Pixelwise saturating `a - b`
fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y).0[0].saturating_sub(b.get_pixel(x, y).0[0])])
    })
}

/// Radius of a square element with an odd side length
fn radius(ksize: u8) -> u8 {
    ksize / 2
}

pub struct BasicMorphology {
    pub binary: GrayImage,
    pub eroded: GrayImage,
    pub dilated: GrayImage,
    pub gradient: GrayImage,
}

/// Erosion, dilation and their difference with a 5x5 element
pub fn basic(gray: &GrayImage) -> BasicMorphology {
    let binary = binary(gray, ops::BINARY_THRESHOLD);
    let k = radius(ops::MORPH_BASIC_KSIZE);
    let eroded = erode(&binary, Norm::LInf, k);
    let dilated = dilate(&binary, Norm::LInf, k);
    let gradient = subtract(&dilated, &eroded);
    BasicMorphology {
        binary,
        eroded,
        dilated,
        gradient,
    }
}

/// Opening and top-hat (`binary - opening`) with a 9x9 element
pub fn opening(gray: &GrayImage) -> (GrayImage, GrayImage, GrayImage) {
    let binary = binary(gray, ops::BINARY_THRESHOLD);
    let opened = open(&binary, Norm::LInf, radius(ops::MORPH_OPEN_KSIZE));
    let top_hat = subtract(&binary, &opened);
    (binary, opened, top_hat)
}

pub(super) fn basic_panels(input: &Frame) -> AppResult<OperationOutput> {
    let result = basic(&input.to_gray());
    Ok(OperationOutput::Panels {
        panels: vec![
            Panel::new("Binary", Frame::gray(result.binary)?),
            Panel::new("Erosion", Frame::gray(result.eroded)?),
            Panel::new("Dilation", Frame::gray(result.dilated)?),
            Panel::new("Gradient", Frame::gray(result.gradient)?),
        ],
        note: None,
    })
}

pub(super) fn opening_panels(input: &Frame) -> AppResult<OperationOutput> {
    let (binary, opened, top_hat) = opening(&input.to_gray());
    Ok(OperationOutput::Panels {
        panels: vec![
            Panel::new("Binary", Frame::gray(binary)?),
            Panel::new("Opening", Frame::gray(opened)?),
            Panel::new("Top-hat", Frame::gray(top_hat)?),
        ],
        note: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::filters::flat_gray;

    fn square(size: u32, from: u32, to: u32) -> GrayImage {
        let mut image = flat_gray(size, size, 0);
        for y in from..to {
            for x in from..to {
                image.put_pixel(x, y, Luma([200]));
            }
        }
        image
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut gray = flat_gray(2, 1, 127);
        gray.put_pixel(1, 0, Luma([128]));
        let out = binary(&gray, 127);
        assert_eq!(out.as_raw(), &vec![0, 255]);
    }

    #[test]
    fn test_basic_morphology_on_square() {
        let result = basic(&square(20, 6, 14));
        // 8x8 square shrinks to 4x4 and grows to 12x12
        let count = |img: &GrayImage| img.iter().filter(|&&v| v == 255).count();
        assert_eq!(count(&result.binary), 64);
        assert_eq!(count(&result.eroded), 16);
        assert_eq!(count(&result.dilated), 144);
        assert_eq!(count(&result.gradient), 144 - 16);
    }

    #[test]
    fn test_opening_removes_small_blobs() {
        let mut gray = square(30, 5, 20);
        gray.put_pixel(26, 26, Luma([255]));
        let (binary, opened, top_hat) = opening(&gray);
        assert_eq!(binary.get_pixel(26, 26).0[0], 255);
        assert_eq!(opened.get_pixel(26, 26).0[0], 0);
        assert_eq!(opened.get_pixel(12, 12).0[0], 255);
        assert_eq!(top_hat.get_pixel(26, 26).0[0], 255);
        assert_eq!(top_hat.get_pixel(12, 12).0[0], 0);
    }
}
