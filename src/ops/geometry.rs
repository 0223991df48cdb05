// SPDX-License-Identifier: MPL-2.0

//! Geometric transforms: rotation, translation, zoom and crop

use super::require_selection;
use crate::constants::ops;
use crate::errors::AppResult;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Selection {
    /// Rectangle spanned by two corner points, in either order
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `width`×`height` image
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Counter-clockwise rotation about the image centre, same size, black fill
pub fn rotate(image: &RgbImage, degrees: f64) -> RgbImage {
    let (w, h) = image.dimensions();
    let (cx, cy) = ((w / 2) as f32, (h / 2) as f32);
    // Image y points down, so a negative angle turns counter-clockwise on screen
    let projection = Projection::translate(cx, cy)
        * Projection::rotate(-(degrees as f32).to_radians())
        * Projection::translate(-cx, -cy);
    let mut out = RgbImage::new(w, h);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    out
}

/// Shift by whole pixels; uncovered pixels are black
pub fn translate(image: &RgbImage, dx: i32, dy: i32) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = RgbImage::new(w, h);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let sx = x as i64 - dx as i64;
        let sy = y as i64 - dy as i64;
        if sx >= 0 && sy >= 0 && sx < w as i64 && sy < h as i64 {
            *pixel = *image.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

/// Bilinear resize by a uniform factor
pub fn zoom(image: &RgbImage, factor: f64) -> RgbImage {
    let factor = factor.clamp(ops::ZOOM_MIN, ops::ZOOM_MAX);
    let (w, h) = image.dimensions();
    let nw = ((w as f64 * factor).round() as u32).max(1);
    let nh = ((h as f64 * factor).round() as u32).max(1);
    image::imageops::resize(image, nw, nh, FilterType::Triangle)
}

/// Copy out the selected rectangle
pub fn crop(image: &RgbImage, selection: Selection) -> AppResult<RgbImage> {
    let sel = require_selection(selection.clamp_to(image.width(), image.height()))?;
    Ok(image::imageops::crop_imm(image, sel.x, sel.y, sel.width, sel.height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn marked(w: u32, h: u32, x: u32, y: u32) -> RgbImage {
        let mut image = RgbImage::new(w, h);
        image.put_pixel(x, y, Rgb([255, 255, 255]));
        image
    }

    #[test]
    fn test_translate_fills_black() {
        let image = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));
        let out = translate(&image, 2, -1);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(2, 0).0, [9, 9, 9]);
        assert_eq!(out.get_pixel(3, 3).0, [0, 0, 0]);
    }

    #[test]
    fn test_rotate_quarter_turn_is_counter_clockwise() {
        // Pixel right of centre should end up above it
        let image = marked(11, 11, 8, 5);
        let out = rotate(&image, 90.0);
        assert_eq!(out.dimensions(), (11, 11));
        assert!(out.get_pixel(5, 2).0[0] > 128, "expected mark above centre");
        assert!(out.get_pixel(8, 5).0[0] < 128);
    }

    #[test]
    fn test_zoom_scales_dimensions() {
        let image = RgbImage::new(10, 4);
        assert_eq!(zoom(&image, 2.0).dimensions(), (20, 8));
        assert_eq!(zoom(&image, 0.1).dimensions(), (1, 1));
    }

    #[test]
    fn test_crop_clamps_and_rejects_empty() {
        let image = marked(6, 6, 5, 5);
        let out = crop(&image, Selection { x: 4, y: 4, width: 10, height: 10 }).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(out.get_pixel(1, 1).0, [255, 255, 255]);

        let err = crop(&image, Selection { x: 7, y: 0, width: 3, height: 3 }).unwrap_err();
        assert_eq!(err, AppError::Cancelled);
    }

    #[test]
    fn test_selection_from_corners() {
        let sel = Selection::from_corners((10, 2), (4, 8));
        assert_eq!(sel, Selection { x: 4, y: 2, width: 6, height: 6 });
        assert!(sel.contains(4, 2));
        assert!(!sel.contains(10, 2));
    }
}
