// SPDX-License-Identifier: MPL-2.0

//! Thick outline drawing on RGB frames
//!
//! imageproc draws one-pixel outlines; annotations here use the thickness
//! convention of the classic CV toolkits, centred on the nominal outline.

use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;
use image::{Rgb, RgbImage};

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Offsets covering a stroke of `thickness` pixels around 0
fn stroke_offsets(thickness: u32) -> impl Iterator<Item = i32> {
    let t = thickness.max(1) as i32;
    (0..t).map(move |k| t / 2 - k)
}

/// Rectangle outline with top-left `(x, y)` and size `w`×`h`
pub fn rect(canvas: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>, thickness: u32) {
    for d in stroke_offsets(thickness) {
        let width = w as i64 + 2 * d as i64;
        let height = h as i64 + 2 * d as i64;
        if width <= 0 || height <= 0 {
            continue;
        }
        draw_hollow_rect_mut(
            canvas,
            Rect::at(x - d, y - d).of_size(width as u32, height as u32),
            color,
        );
    }
}

/// Line segment between two points
pub fn line(
    canvas: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    color: Rgb<u8>,
    thickness: u32,
) {
    for dy in stroke_offsets(thickness) {
        for dx in stroke_offsets(thickness) {
            draw_line_segment_mut(
                canvas,
                (start.0 + dx as f32, start.1 + dy as f32),
                (end.0 + dx as f32, end.1 + dy as f32),
                color,
            );
        }
    }
}

/// Circle outline
pub fn circle(canvas: &mut RgbImage, center: (i32, i32), radius: i32, color: Rgb<u8>, thickness: u32) {
    for d in stroke_offsets(thickness) {
        let r = radius + d;
        if r > 0 {
            draw_hollow_circle_mut(canvas, center, r, color);
        }
    }
}

/// Filled disc
pub fn disc(canvas: &mut RgbImage, center: (i32, i32), radius: i32, color: Rgb<u8>) {
    draw_filled_circle_mut(canvas, center, radius.max(0), color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thick_rect_covers_both_sides() {
        let mut img = RgbImage::new(20, 20);
        rect(&mut img, 5, 5, 10, 10, RED, 2);
        assert_eq!(*img.get_pixel(5, 10), RED);
        assert_eq!(*img.get_pixel(4, 10), RED);
        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_drawing_outside_is_clipped() {
        let mut img = RgbImage::new(8, 8);
        line(&mut img, (-20.0, 4.0), (40.0, 4.0), GREEN, 2);
        circle(&mut img, (100, 100), 5, BLUE, 2);
        assert_eq!(*img.get_pixel(0, 4), GREEN);
    }
}
