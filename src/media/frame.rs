// SPDX-License-Identifier: MPL-2.0

//! Frame type used across the application
//!
//! A frame is either an 8-bit RGB image or an 8-bit single-channel intensity
//! image. Both variants always have positive width and height.

use crate::errors::{AppResult, OperationError};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use std::path::Path;

/// BT.601 luma weights
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// One raster image: a camera capture or a loaded/derived still image
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// 3-channel RGB, 8 bits per channel
    Color(RgbImage),
    /// 1-channel intensity
    Gray(GrayImage),
}

impl Frame {
    /// Wrap a colour image, rejecting empty buffers
    pub fn color(image: RgbImage) -> AppResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OperationError::EmptyFrame.into());
        }
        Ok(Frame::Color(image))
    }

    /// Wrap an intensity image, rejecting empty buffers
    pub fn gray(image: GrayImage) -> AppResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OperationError::EmptyFrame.into());
        }
        Ok(Frame::Gray(image))
    }

    /// Convert any decoded image to a colour frame
    pub fn from_dynamic(image: DynamicImage) -> AppResult<Self> {
        Self::color(image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        match self {
            Frame::Color(img) => img.width(),
            Frame::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Color(img) => img.height(),
            Frame::Gray(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_gray(&self) -> bool {
        matches!(self, Frame::Gray(_))
    }

    /// Number of channels (1 or 3)
    pub fn channels(&self) -> u8 {
        if self.is_gray() { 1 } else { 3 }
    }

    /// Single-channel intensity version of this frame
    pub fn to_gray(&self) -> GrayImage {
        match self {
            Frame::Gray(img) => img.clone(),
            Frame::Color(img) => rgb_to_gray(img),
        }
    }

    /// 3-channel version of this frame (intensity replicated for gray frames)
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Frame::Color(img) => img.clone(),
            Frame::Gray(img) => gray_to_rgb(img),
        }
    }

    /// Consume the frame into a 3-channel image
    pub fn into_rgb(self) -> RgbImage {
        match self {
            Frame::Color(img) => img,
            Frame::Gray(img) => gray_to_rgb(&img),
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Frame::Color(img) => DynamicImage::ImageRgb8(img.clone()),
            Frame::Gray(img) => DynamicImage::ImageLuma8(img.clone()),
        }
    }

    /// Write the frame to disk; the format follows the file extension
    pub fn save(&self, path: &Path) -> AppResult<()> {
        match self {
            Frame::Color(img) => img.save(path)?,
            Frame::Gray(img) => img.save(path)?,
        }
        Ok(())
    }
}

/// BT.601 luma of one RGB pixel, rounded to nearest
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    (LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Convert an RGB image to intensity with BT.601 weights
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(image.get_pixel(x, y))])
    })
}

/// Replicate an intensity image into three channels
pub fn gray_to_rgb(image: &GrayImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frames_rejected() {
        assert!(Frame::color(RgbImage::new(0, 4)).is_err());
        assert!(Frame::gray(GrayImage::new(4, 0)).is_err());
        assert!(Frame::color(RgbImage::new(1, 1)).is_ok());
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(&Rgb([255, 255, 255])), 255);
        assert_eq!(luma(&Rgb([0, 0, 0])), 0);
        // 0.299 * 255 = 76.2
        assert_eq!(luma(&Rgb([255, 0, 0])), 76);
        // 0.587 * 255 = 149.7
        assert_eq!(luma(&Rgb([0, 255, 0])), 150);
    }

    #[test]
    fn test_gray_round_trip_keeps_intensity() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 40 + y * 7) as u8]));
        let frame = Frame::gray(gray.clone()).unwrap();
        let rgb = frame.to_rgb();
        assert_eq!(rgb_to_gray(&rgb), gray);
        assert_eq!(frame.channels(), 1);
    }
}
