// SPDX-License-Identifier: MPL-2.0

//! Gradient and edge operators

use super::{OperationOutput, Panel};
use crate::constants::ops;
use crate::errors::AppResult;
use crate::media::Frame;
use crate::media::kernel::{self, Plane};
use image::GrayImage;

/// Smoothing and derivative taps of the Sobel operator for sizes 3 and 5
fn sobel_taps(ksize: u32) -> (&'static [f32], &'static [f32]) {
    match ksize {
        3 => (&[1.0, 2.0, 1.0], &[-1.0, 0.0, 1.0]),
        _ => (&[1.0, 4.0, 6.0, 4.0, 1.0], &[-1.0, -2.0, 0.0, 2.0, 1.0]),
    }
}

/// Signed x and y derivatives
pub fn sobel_xy(plane: &Plane, ksize: u32) -> (Plane, Plane) {
    let (smooth, deriv) = sobel_taps(ksize);
    let gx = kernel::separable(plane, deriv, smooth);
    let gy = kernel::separable(plane, smooth, deriv);
    (gx, gy)
}

/// Absolute x and y responses and their magnitude, each saturated to 8 bits
pub fn sobel(gray: &GrayImage) -> (GrayImage, GrayImage, GrayImage) {
    let (gx, gy) = sobel_xy(&Plane::from_gray(gray), ops::SOBEL_KSIZE);
    let mut magnitude = Plane::new(gx.width, gx.height);
    for (m, (x, y)) in magnitude
        .data
        .iter_mut()
        .zip(gx.data.iter().zip(gy.data.iter()))
    {
        *m = x.hypot(*y);
    }
    (gx.abs_to_gray(), gy.abs_to_gray(), magnitude.abs_to_gray())
}

pub(super) fn sobel_panels(input: &Frame) -> AppResult<OperationOutput> {
    let (x, y, magnitude) = sobel(&input.to_gray());
    Ok(OperationOutput::Panels {
        panels: vec![
            Panel::new("Sobel X", Frame::gray(x)?),
            Panel::new("Sobel Y", Frame::gray(y)?),
            Panel::new("Magnitude", Frame::gray(magnitude)?),
        ],
        note: None,
    })
}

/// Canny edge map; the lower threshold never exceeds the upper one
pub fn canny(gray: &GrayImage, low: u8, high: u8) -> GrayImage {
    let low = low.min(high);
    imageproc::edges::canny(gray, low as f32, high as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn vertical_edge() -> GrayImage {
        GrayImage::from_fn(12, 12, |x, _| Luma([if x < 6 { 20 } else { 220 }]))
    }

    #[test]
    fn test_sobel_separates_directions() {
        let (x, y, magnitude) = sobel(&vertical_edge());
        assert_eq!(x.get_pixel(6, 6).0[0], 255);
        assert_eq!(x.get_pixel(1, 6).0[0], 0);
        assert!(y.iter().all(|&v| v == 0));
        assert_eq!(magnitude.get_pixel(6, 6).0[0], 255);
    }

    #[test]
    fn test_canny_is_binary_and_orders_thresholds() {
        let edges = canny(&vertical_edge(), 250, 40);
        assert!(edges.iter().all(|&v| v == 0 || v == 255));
        assert!(edges.iter().any(|&v| v == 255));
    }
}
