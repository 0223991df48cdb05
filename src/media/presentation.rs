// SPDX-License-Identifier: MPL-2.0

//! Scaling frames into display surfaces

use super::Frame;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Size of a `width`×`height` image scaled to fit a `max`×`max` box.
///
/// The scale factor is `min(max / width, max / height)`, so small images are
/// enlarged as well as large ones reduced. Each side is at least one pixel.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (max as f64 / width as f64).min(max as f64 / height as f64);
    let w = ((width as f64 * scale) as u32).max(1);
    let h = ((height as f64 * scale) as u32).max(1);
    (w, h)
}

/// Render a frame for display: gray is expanded to RGB and the result is
/// scaled to fit within `max`.
pub fn render(frame: &Frame, max: u32) -> RgbaImage {
    let rgba = image::DynamicImage::ImageRgb8(frame.to_rgb()).to_rgba8();
    let (w, h) = fit_within(frame.width(), frame.height(), max);
    if (w, h) == frame.dimensions() {
        return rgba;
    }
    imageops::resize(&rgba, w, h, FilterType::Triangle)
}

/// Build an image handle for the GUI panes
pub fn image_handle(frame: &Frame, max: u32) -> cosmic::widget::image::Handle {
    let rgba = render(frame, max);
    let (w, h) = rgba.dimensions();
    cosmic::widget::image::Handle::from_rgba(w, h, rgba.into_raw())
}

/// Map a point in display coordinates back to image coordinates
pub fn to_image_coords(
    (px, py): (f32, f32),
    displayed: (u32, u32),
    image: (u32, u32),
) -> (i32, i32) {
    if displayed.0 == 0 || displayed.1 == 0 {
        return (0, 0);
    }
    let sx = image.0 as f32 / displayed.0 as f32;
    let sy = image.1 as f32 / displayed.1 as f32;
    ((px * sx) as i32, (py * sy) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_fit_within_downscales() {
        assert_eq!(fit_within(1200, 600, 600), (600, 300));
        assert_eq!(fit_within(600, 1200, 600), (300, 600));
    }

    #[test]
    fn test_fit_within_upscales_small_images() {
        assert_eq!(fit_within(100, 50, 800), (800, 400));
    }

    #[test]
    fn test_fit_within_never_zero() {
        assert_eq!(fit_within(10_000, 1, 500), (500, 1));
    }

    #[test]
    fn test_render_expands_gray() {
        let frame = Frame::gray(GrayImage::from_pixel(4, 2, Luma([9]))).unwrap();
        let out = render(&frame, 8);
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(out.get_pixel(0, 0).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_to_image_coords() {
        assert_eq!(to_image_coords((50.0, 25.0), (100, 50), (200, 100)), (100, 50));
    }
}
