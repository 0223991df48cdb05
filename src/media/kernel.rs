// SPDX-License-Identifier: MPL-2.0

//! Floating-point linear filtering
//!
//! Planes are single-channel `f32` images. Borders are handled by mirroring
//! without repeating the edge pixel (`dcb|abcd|cba`), and kernels are applied
//! as correlations (not flipped), matching the usual `filter2D` semantics.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// Single-channel floating point image
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.iter().map(|&v| v as f32).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: f32) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = v;
    }

    /// Largest value, or 0 for an empty plane
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::MIN, f32::max).max(0.0)
    }

    /// Round and saturate to 8 bits
    pub fn to_gray(&self) -> GrayImage {
        self.map_to_gray(|v| v)
    }

    /// Absolute value, rounded and saturated to 8 bits
    pub fn abs_to_gray(&self) -> GrayImage {
        self.map_to_gray(f32::abs)
    }

    fn map_to_gray(&self, f: impl Fn(f32) -> f32) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([f(self.get(x, y)).round().clamp(0.0, 255.0) as u8])
        })
    }
}

/// Mirror index into `0..n` without repeating the border sample
#[inline]
fn reflect101(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

/// Correlate a plane with a `kw`×`kh` kernel (row-major) anchored at its centre
pub fn correlate(plane: &Plane, kernel: &[f32], kw: usize, kh: usize) -> Plane {
    debug_assert_eq!(kernel.len(), kw * kh);
    let (w, h) = (plane.width as usize, plane.height as usize);
    let (ax, ay) = ((kw / 2) as i64, (kh / 2) as i64);
    let mut out = Plane::new(plane.width, plane.height);

    // Border lookup tables over the padded range
    let cols: Vec<usize> = (0..(w + kw - 1) as i64)
        .map(|i| reflect101(i - ax, w as i64))
        .collect();
    let rows: Vec<usize> = (0..(h + kh - 1) as i64)
        .map(|i| reflect101(i - ay, h as i64))
        .collect();
    let taps: Vec<(usize, usize, f32)> = (0..kh)
        .flat_map(|ky| (0..kw).map(move |kx| (kx, ky)))
        .map(|(kx, ky)| (kx, ky, kernel[ky * kw + kx]))
        .filter(|&(_, _, k)| k != 0.0)
        .collect();

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for &(kx, ky, k) in &taps {
                acc += k * plane.data[rows[y + ky] * w + cols[x + kx]];
            }
            out.data[y * w + x] = acc;
        }
    }
    out
}

/// Apply a row kernel then a column kernel
pub fn separable(plane: &Plane, kx: &[f32], ky: &[f32]) -> Plane {
    let rows = correlate(plane, kx, kx.len(), 1);
    correlate(&rows, ky, 1, ky.len())
}

/// Gaussian sigma implied by an odd kernel size when none is given
pub fn sigma_for_ksize(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Odd kernel size covering ±4 sigma (8-bit images)
pub fn ksize_for_sigma(sigma: f32) -> u32 {
    (((sigma * 8.0 + 1.0).round() as u32) | 1).max(1)
}

/// Normalised 1-D gaussian
pub fn gaussian_kernel(ksize: u32, sigma: f32) -> Vec<f32> {
    let ksize = ksize.max(1) as i32;
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        sigma_for_ksize(ksize as u32)
    };
    let half = ksize / 2;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    kernel
}

/// Split an RGB image into three planes
pub fn rgb_planes(image: &RgbImage) -> [Plane; 3] {
    let mut planes = [
        Plane::new(image.width(), image.height()),
        Plane::new(image.width(), image.height()),
        Plane::new(image.width(), image.height()),
    ];
    for (i, p) in image.pixels().enumerate() {
        for c in 0..3 {
            planes[c].data[i] = p.0[c] as f32;
        }
    }
    planes
}

/// Merge three planes back into an RGB image, rounding and saturating
pub fn merge_rgb(planes: &[Plane; 3]) -> RgbImage {
    let (w, h) = (planes[0].width, planes[0].height);
    RgbImage::from_fn(w, h, |x, y| {
        let v = |c: usize| planes[c].get(x, y).round().clamp(0.0, 255.0) as u8;
        Rgb([v(0), v(1), v(2)])
    })
}

/// Gaussian blur of each RGB channel, kept in floating point
pub fn gaussian_planes(image: &RgbImage, ksize: u32, sigma: f32) -> [Plane; 3] {
    let kernel = gaussian_kernel(ksize, sigma);
    rgb_planes(image).map(|p| separable(&p, &kernel, &kernel))
}

/// Gaussian blur of an RGB image
pub fn gaussian_blur(image: &RgbImage, ksize: u32, sigma: f32) -> RgbImage {
    merge_rgb(&gaussian_planes(image, ksize, sigma))
}

/// Correlate each RGB channel with the same kernel
pub fn correlate_rgb(image: &RgbImage, kernel: &[f32], kw: usize, kh: usize) -> RgbImage {
    merge_rgb(&rgb_planes(image).map(|p| correlate(&p, kernel, kw, kh)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-3, 1), 0);
    }

    #[test]
    fn test_gaussian_kernel_normalised() {
        let k = gaussian_kernel(5, 0.0);
        assert_eq!(k.len(), 5);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[2] > k[1] && k[1] > k[0]);
    }

    #[test]
    fn test_ksize_for_sigma_is_odd() {
        assert_eq!(ksize_for_sigma(3.0), 25);
        assert_eq!(ksize_for_sigma(0.1) % 2, 1);
    }

    #[test]
    fn test_box_filter_on_constant_plane() {
        let plane = Plane {
            width: 4,
            height: 3,
            data: vec![7.0; 12],
        };
        let out = correlate(&plane, &[1.0 / 9.0; 9], 3, 3);
        assert!(out.data.iter().all(|v| (v - 7.0).abs() < 1e-4));
    }

    #[test]
    fn test_correlation_is_not_flipped() {
        // Kernel picks the right-hand neighbour
        let plane = Plane {
            width: 3,
            height: 1,
            data: vec![1.0, 2.0, 3.0],
        };
        let out = correlate(&plane, &[0.0, 0.0, 1.0], 3, 1);
        assert_eq!(out.data, vec![2.0, 3.0, 2.0]);
    }
}
