// SPDX-License-Identifier: MPL-2.0

//! Segmentation: k-means colour quantisation, watershed and object masking

use super::{Selection, require_selection};
use crate::constants::ops;
use crate::errors::{AppError, AppResult, OperationError};
use crate::media::draw;
use crate::media::frame::rgb_to_gray;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::{Norm, euclidean_squared_distance_transform};
use imageproc::morphology;
use imageproc::region_labelling::{Connectivity, connected_components};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

/// Samples used to fit cluster centres; the final labelling covers every pixel
const MAX_FIT_SAMPLES: usize = 20_000;

/// Small deterministic generator so results are repeatable
#[derive(Debug, Clone)]
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

type Color = [f32; 3];

fn distance2(a: &Color, b: &Color) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn nearest(centres: &[Color], sample: &Color) -> (usize, f32) {
    centres
        .iter()
        .enumerate()
        .map(|(i, c)| (i, distance2(c, sample)))
        .fold((0, f32::MAX), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Evenly strided subset of the pixels
fn fit_samples(image: &RgbImage) -> Vec<Color> {
    let total = image.pixels().len();
    let stride = total.div_ceil(MAX_FIT_SAMPLES).max(1);
    image
        .pixels()
        .step_by(stride)
        .map(|p| p.0.map(|c| c as f32))
        .collect()
}

/// k-means++ seeding
fn seed_centres(samples: &[Color], k: usize, rng: &mut XorShift) -> Vec<Color> {
    let mut centres = vec![samples[rng.below(samples.len())]];
    let mut weights: Vec<f32> = samples.iter().map(|s| distance2(s, &centres[0])).collect();
    while centres.len() < k {
        let total: f32 = weights.iter().sum();
        let next = if total <= 0.0 {
            samples[rng.below(samples.len())]
        } else {
            let mut target = rng.unit() * total;
            let mut chosen = samples.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                target -= w;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            samples[chosen]
        };
        for (w, s) in weights.iter_mut().zip(samples) {
            *w = w.min(distance2(s, &next));
        }
        centres.push(next);
    }
    centres
}

/// Lloyd iterations until no centre moves more than `eps` or `max_iter` is hit.
/// Returns the centres and the compactness (sum of squared distances).
fn lloyd(samples: &[Color], mut centres: Vec<Color>, max_iter: usize, eps: f32) -> (Vec<Color>, f32) {
    let k = centres.len();
    let mut labels = vec![0usize; samples.len()];
    for _ in 0..max_iter {
        for (label, s) in labels.iter_mut().zip(samples) {
            *label = nearest(&centres, s).0;
        }
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (&label, s) in labels.iter().zip(samples) {
            counts[label] += 1;
            for c in 0..3 {
                sums[label][c] += s[c] as f64;
            }
        }
        let mut shift = 0.0f32;
        for i in 0..k {
            // Empty clusters keep their previous centre
            if counts[i] == 0 {
                continue;
            }
            let updated = sums[i].map(|v| (v / counts[i] as f64) as f32);
            shift = shift.max(distance2(&updated, &centres[i]).sqrt());
            centres[i] = updated;
        }
        if shift <= eps {
            break;
        }
    }
    let compactness = samples.iter().map(|s| nearest(&centres, s).1).sum();
    (centres, compactness)
}

/// Best of several seeded k-means runs
fn cluster(samples: &[Color], k: usize, attempts: usize, seed: u64) -> Vec<Color> {
    let mut rng = XorShift::new(seed);
    let mut best: Option<(Vec<Color>, f32)> = None;
    for _ in 0..attempts.max(1) {
        let seeds = seed_centres(samples, k, &mut rng);
        let (centres, compactness) = lloyd(samples, seeds, ops::KMEANS_MAX_ITER, ops::KMEANS_EPS);
        if best.as_ref().is_none_or(|(_, c)| compactness < *c) {
            best = Some((centres, compactness));
        }
    }
    best.map(|(centres, _)| centres).unwrap_or_default()
}

/// Replace every pixel by the centre of its colour cluster
pub fn kmeans(image: &RgbImage, k: u32) -> RgbImage {
    let k = k.clamp(ops::KMEANS_MIN, ops::KMEANS_MAX) as usize;
    let samples = fit_samples(image);
    let centres = cluster(&samples, k, ops::KMEANS_ATTEMPTS, 0x9E37_79B9_7F4A_7C15);
    debug!(k, samples = samples.len(), "K-means centres fitted");

    let palette: Vec<Rgb<u8>> = centres
        .iter()
        .map(|c| Rgb(c.map(|v| v.round().clamp(0.0, 255.0) as u8)))
        .collect();
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let sample = pixel.0.map(|c| c as f32);
        *pixel = palette[nearest(&centres, &sample).0];
    }
    out
}

/// Label of a watershed boundary pixel
pub const BOUNDARY: i32 = -1;
const IN_QUEUE: i32 = -2;

/// Marker-driven flooding over colour differences
///
/// `labels` holds positive seed labels and 0 for pixels to assign. Pixels are
/// flooded in order of the largest channel difference to the neighbour that
/// reached them; a pixel touching two different labels becomes
/// [`BOUNDARY`]. The outer image frame is always boundary.
pub fn flood(image: &RgbImage, labels: &mut [i32]) {
    let (w, h) = (image.width() as usize, image.height() as usize);
    debug_assert_eq!(labels.len(), w * h);
    let raw = image.as_raw();
    let diff = |a: usize, b: usize| -> u8 {
        (0..3)
            .map(|c| raw[a * 3 + c].abs_diff(raw[b * 3 + c]))
            .max()
            .unwrap_or(0)
    };
    let neighbours = |i: usize| -> [Option<usize>; 4] {
        let (x, y) = (i % w, i / w);
        [
            (x > 0).then(|| i - 1),
            (x + 1 < w).then(|| i + 1),
            (y > 0).then(|| i - w),
            (y + 1 < h).then(|| i + w),
        ]
    };

    for x in 0..w {
        labels[x] = BOUNDARY;
        labels[(h - 1) * w + x] = BOUNDARY;
    }
    for y in 0..h {
        labels[y * w] = BOUNDARY;
        labels[y * w + w - 1] = BOUNDARY;
    }

    let mut queue = BinaryHeap::new();
    let mut order = 0u64;
    for i in 0..w * h {
        if labels[i] != 0 {
            continue;
        }
        let priority = neighbours(i)
            .into_iter()
            .flatten()
            .filter(|&n| labels[n] > 0)
            .map(|n| diff(i, n))
            .min();
        if let Some(priority) = priority {
            labels[i] = IN_QUEUE;
            queue.push(Reverse((priority, order, i)));
            order += 1;
        }
    }

    while let Some(Reverse((_, _, i))) = queue.pop() {
        let mut label = 0;
        for n in neighbours(i).into_iter().flatten() {
            let l = labels[n];
            if l > 0 {
                if label == 0 {
                    label = l;
                } else if label != l {
                    label = BOUNDARY;
                }
            }
        }
        labels[i] = if label == 0 { BOUNDARY } else { label };
        if label <= 0 {
            continue;
        }
        for n in neighbours(i).into_iter().flatten() {
            if labels[n] == 0 {
                labels[n] = IN_QUEUE;
                queue.push(Reverse((diff(i, n), order, n)));
                order += 1;
            }
        }
    }
}

fn paint_boundaries(image: &RgbImage, labels: &[i32]) -> RgbImage {
    let mut out = image.clone();
    for (pixel, &label) in out.pixels_mut().zip(labels) {
        if label == BOUNDARY {
            *pixel = draw::RED;
        }
    }
    out
}

/// Watershed seeded from the distance transform of an Otsu foreground
pub fn watershed_auto(image: &RgbImage) -> RgbImage {
    let gray = rgb_to_gray(image);
    let level = imageproc::contrast::otsu_level(&gray);
    let binary = map_gray(&gray, |v| if v > level { 0 } else { 255 });

    let opened = morphology::open(&binary, Norm::LInf, 2);
    let sure_bg = morphology::dilate(&opened, Norm::LInf, 3);

    // Distance of every foreground pixel to the nearest background pixel
    let background = map_gray(&opened, |v| if v == 0 { 255 } else { 0 });
    let distances = euclidean_squared_distance_transform(&background);
    let dist: Vec<f64> = distances
        .iter()
        .map(|&d| if d.is_finite() { d.sqrt() } else { f64::MAX })
        .collect();
    let max = dist
        .iter()
        .copied()
        .filter(|d| *d < f64::MAX)
        .fold(0.0f64, f64::max);
    let cutoff = ops::WATERSHED_FG_RATIO as f64 * max;
    let sure_fg = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let d = dist[y as usize * gray.width() as usize + x as usize];
        Luma([if max > 0.0 && d > cutoff { 255 } else { 0 }])
    });

    let components = connected_components(&sure_fg, Connectivity::Eight, Luma([0u8]));
    let mut labels: Vec<i32> = components
        .pixels()
        .zip(sure_bg.pixels().zip(sure_fg.pixels()))
        .map(|(component, (bg, fg))| {
            let unknown = bg.0[0] > 0 && fg.0[0] == 0;
            if unknown {
                0
            } else {
                component.0[0] as i32 + 1
            }
        })
        .collect();
    debug!(level, max_distance = max, "Watershed markers prepared");

    flood(image, &mut labels);
    paint_boundaries(image, &labels)
}

/// Watershed from user markers (1 foreground, 2 background, 0 unknown)
pub fn watershed_markers(image: &RgbImage, markers: &GrayImage) -> AppResult<RgbImage> {
    if markers.dimensions() != image.dimensions() {
        return Err(OperationError::InvalidParameter(format!(
            "marker size {:?} does not match image size {:?}",
            markers.dimensions(),
            image.dimensions()
        ))
        .into());
    }
    if markers.iter().all(|&m| m == 0) {
        return Err(AppError::Cancelled);
    }
    let mut labels: Vec<i32> = markers.iter().map(|&m| m as i32).collect();
    flood(image, &mut labels);
    Ok(paint_boundaries(image, &labels))
}

/// Foreground extraction seeded by a rectangle
///
/// Outside the rectangle is certain background and alone fits the background
/// colour model. Inside, pixels are reassigned each round to whichever model
/// (a handful of k-means centres per side) fits them better, a tie going to
/// the background, followed by a 3x3 majority vote to keep the mask coherent.
/// Pixels outside the final foreground are blacked out.
pub fn mask_object(image: &RgbImage, selection: Selection) -> AppResult<RgbImage> {
    let (w, h) = image.dimensions();
    let sel = require_selection(selection.clamp_to(w, h))?;
    let components = 5usize;

    let mut foreground = GrayImage::from_fn(w, h, |x, y| {
        Luma([if sel.contains(x, y) { 255 } else { 0 }])
    });

    let stride = |n: usize| n.div_ceil(MAX_FIT_SAMPLES / 2).max(1);
    let bg_samples: Vec<Color> = image
        .enumerate_pixels()
        .filter(|(x, y, _)| !sel.contains(*x, *y))
        .map(|(_, _, pixel)| pixel.0.map(|c| c as f32))
        .collect();
    let bg_fit: Vec<Color> = bg_samples.iter().step_by(stride(bg_samples.len())).copied().collect();
    let bg_model = if bg_fit.is_empty() {
        Vec::new()
    } else {
        cluster(&bg_fit, components.min(bg_fit.len()), 1, 31)
    };

    for round in 0..ops::MASK_ITERATIONS {
        let fg_samples: Vec<Color> = image
            .enumerate_pixels()
            .filter(|(x, y, _)| foreground.get_pixel(*x, *y).0[0] > 0)
            .map(|(_, _, pixel)| pixel.0.map(|c| c as f32))
            .collect();
        if fg_samples.is_empty() || bg_model.is_empty() {
            break;
        }
        let fg_fit: Vec<Color> = fg_samples.iter().step_by(stride(fg_samples.len())).copied().collect();
        let fg_model = cluster(&fg_fit, components.min(fg_fit.len()), 1, 17 + round as u64);

        let assigned = GrayImage::from_fn(w, h, |x, y| {
            if !sel.contains(x, y) {
                return Luma([0]);
            }
            let sample = image.get_pixel(x, y).0.map(|c| c as f32);
            let to_fg = nearest(&fg_model, &sample).1;
            let to_bg = nearest(&bg_model, &sample).1;
            Luma([if to_fg < to_bg { 255 } else { 0 }])
        });
        let smoothed = imageproc::filter::median_filter(&assigned, 1, 1);
        if smoothed == foreground {
            debug!(round, "Object mask converged");
            break;
        }
        foreground = smoothed;
    }

    let mut out = image.clone();
    for (pixel, mask) in out.pixels_mut().zip(foreground.pixels()) {
        if mask.0[0] == 0 {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    Ok(out)
}

fn map_gray(image: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([f(image.get_pixel(x, y).0[0])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> RgbImage {
        RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgb([200, 30, 30])
            } else {
                Rgb([20, 40, 220])
            }
        })
    }

    #[test]
    fn test_kmeans_recovers_two_colours() {
        let out = kmeans(&two_tone(), 2);
        assert_eq!(out, two_tone());
    }

    #[test]
    fn test_kmeans_is_deterministic() {
        let image = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 90]));
        assert_eq!(kmeans(&image, 4), kmeans(&image, 4));
    }

    #[test]
    fn test_flood_separates_regions() {
        let image = two_tone();
        let mut labels = vec![0i32; 200];
        labels[5 * 20 + 3] = 1;
        labels[5 * 20 + 16] = 2;
        flood(&image, &mut labels);

        assert_eq!(labels[0], BOUNDARY);
        assert_eq!(labels[5 * 20 + 5], 1);
        assert_eq!(labels[5 * 20 + 13], 2);
        let boundary_cols: Vec<usize> = (1..19).filter(|&x| labels[5 * 20 + x] == BOUNDARY).collect();
        assert_eq!(boundary_cols.len(), 1);
        assert!((9..=10).contains(&boundary_cols[0]));
    }

    #[test]
    fn test_watershed_markers_rejects_blank_canvas() {
        let image = two_tone();
        let blank = GrayImage::new(20, 10);
        assert_eq!(
            watershed_markers(&image, &blank).unwrap_err(),
            AppError::Cancelled
        );
        let wrong = GrayImage::new(3, 3);
        assert!(matches!(
            watershed_markers(&image, &wrong).unwrap_err(),
            AppError::Operation(OperationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_watershed_auto_draws_red_boundaries() {
        let mut image = RgbImage::from_pixel(60, 40, Rgb([230, 230, 230]));
        imageproc::drawing::draw_filled_circle_mut(&mut image, (18, 20), 10, Rgb([20, 20, 20]));
        imageproc::drawing::draw_filled_circle_mut(&mut image, (42, 20), 10, Rgb([20, 20, 20]));
        let out = watershed_auto(&image);
        assert_eq!(out.dimensions(), image.dimensions());
        assert_eq!(out.get_pixel(0, 0), &draw::RED);
        let interior_red = (1..59).any(|x| out.get_pixel(x, 20) == &draw::RED);
        assert!(interior_red);
    }

    #[test]
    fn test_mask_object_blacks_out_background() {
        let mut image = RgbImage::from_pixel(40, 40, Rgb([20, 120, 20]));
        for y in 12..28 {
            for x in 12..28 {
                image.put_pixel(x, y, Rgb([230, 200, 40]));
            }
        }
        let out = mask_object(&image, Selection { x: 8, y: 8, width: 24, height: 24 }).unwrap();
        assert_eq!(out.get_pixel(20, 20).0, [230, 200, 40]);
        assert_eq!(out.get_pixel(13, 20).0, [230, 200, 40]);
        assert_eq!(out.get_pixel(2, 2).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(9, 9).0, [0, 0, 0]);
    }

    #[test]
    fn test_mask_object_keeps_most_of_the_object() {
        let mut image = RgbImage::from_pixel(60, 50, Rgb([40, 60, 200]));
        for y in 15..35 {
            for x in 20..44 {
                image.put_pixel(x, y, Rgb([220, 40, 40]));
            }
        }
        let out = mask_object(&image, Selection { x: 14, y: 10, width: 36, height: 30 }).unwrap();
        let kept = (15..35)
            .flat_map(|y| (20..44).map(move |x| (x, y)))
            .filter(|&(x, y)| out.get_pixel(x, y).0 == [220, 40, 40])
            .count();
        assert!(kept >= 20 * 24 - 4, "kept {} object pixels", kept);
        let leaked = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [40, 60, 200])
            .count();
        assert_eq!(leaked, 0, "background pixels survived");
    }

    #[test]
    fn test_mask_object_full_frame_selection_keeps_everything() {
        let image = RgbImage::from_pixel(12, 12, Rgb([10, 20, 30]));
        let out = mask_object(&image, Selection { x: 0, y: 0, width: 12, height: 12 }).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_mask_object_empty_selection_cancels() {
        let image = RgbImage::new(10, 10);
        let err = mask_object(&image, Selection::default()).unwrap_err();
        assert_eq!(err, AppError::Cancelled);
    }
}
