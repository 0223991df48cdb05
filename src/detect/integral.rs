// SPDX-License-Identifier: MPL-2.0

//! Summed-area tables for constant-time rectangle sums

use image::GrayImage;

/// Integral and squared-integral image of an 8-bit intensity image.
///
/// Both tables are `(width + 1) × (height + 1)`; entry `(x, y)` holds the sum
/// over pixels `[0, x) × [0, y)`.
pub struct IntegralImage {
    width: u32,
    height: u32,
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl IntegralImage {
    pub fn new(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let stride = width as usize + 1;
        let mut sum = vec![0u64; stride * (height as usize + 1)];
        let mut sq_sum = vec![0u64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..width as usize {
                let v = image.get_pixel(x as u32, y as u32).0[0] as u64;
                row += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self {
            width,
            height,
            stride,
            sum,
            sq_sum,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sum of pixels in the rectangle; the rectangle must lie inside the image
    #[inline]
    pub fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        Self::lookup(&self.sum, self.stride, x, y, w, h)
    }

    /// Sum of squared pixels in the rectangle
    #[inline]
    pub fn rect_sq_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        Self::lookup(&self.sq_sum, self.stride, x, y, w, h)
    }

    #[inline]
    fn lookup(table: &[u64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> i64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let a = table[y0 * stride + x0] as i64;
        let b = table[y0 * stride + x1] as i64;
        let c = table[y1 * stride + x0] as i64;
        let d = table[y1 * stride + x1] as i64;
        d - b - c + a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_rect_sums_match_brute_force() {
        let img = GrayImage::from_fn(7, 5, |x, y| Luma([(x * 11 + y * 3) as u8]));
        let ii = IntegralImage::new(&img);

        let (x, y, w, h) = (2, 1, 4, 3);
        let mut expected = 0i64;
        let mut expected_sq = 0i64;
        for yy in y..y + h {
            for xx in x..x + w {
                let v = img.get_pixel(xx, yy).0[0] as i64;
                expected += v;
                expected_sq += v * v;
            }
        }

        assert_eq!(ii.rect_sum(x, y, w, h), expected);
        assert_eq!(ii.rect_sq_sum(x, y, w, h), expected_sq);
        assert_eq!(ii.rect_sum(0, 0, 7, 5), img.pixels().map(|p| p.0[0] as i64).sum());
    }
}
