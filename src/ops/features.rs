// SPDX-License-Identifier: MPL-2.0

//! Feature detectors: faces, circles, lines, corners and colour masks

use super::edges::sobel_xy;
use super::{OpContext, OperationOutput, Panel};
use crate::constants::{cascades, ops};
use crate::errors::{AppResult, PreconditionError};
use crate::media::frame::rgb_to_gray;
use crate::media::kernel::Plane;
use crate::media::{Frame, draw};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use tracing::debug;

/// Faces in red and eyes in green, using the still-image detection parameters
pub fn faces_and_eyes(image: &RgbImage, ctx: &OpContext) -> AppResult<RgbImage> {
    let detector = ctx
        .detector
        .as_ref()
        .ok_or(PreconditionError::CascadesMissing)?;
    let mut out = image.clone();
    let faces = detector.annotate(
        &mut out,
        cascades::STILL_SCALE_FACTOR,
        cascades::STILL_FACE_THICKNESS,
    );
    debug!(faces, "Faces annotated");
    Ok(out)
}

/// A detected circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: u32,
    pub y: u32,
    pub radius: u32,
}

/// Gradient Hough transform on the median-smoothed gray image
///
/// Every edge pixel votes along its gradient direction for centres within
/// the radius range. Local maxima of the 3x3-pooled accumulator above the
/// vote threshold are
/// taken strongest first, skipping any closer than the minimum distance to
/// an accepted centre. The radius is the distance most edge pixels agree on.
pub fn find_circles(gray: &GrayImage) -> Vec<Circle> {
    let radius = ops::CIRCLE_MEDIAN_KSIZE / 2;
    let smoothed = imageproc::filter::median_filter(gray, radius, radius);
    let edges = imageproc::edges::canny(
        &smoothed,
        ops::CIRCLE_CANNY_HIGH / 2.0,
        ops::CIRCLE_CANNY_HIGH,
    );
    let (gx, gy) = sobel_xy(&Plane::from_gray(&smoothed), 3);

    let (w, h) = gray.dimensions();
    let (min_r, max_r) = (ops::CIRCLE_MIN_RADIUS as f32, ops::CIRCLE_MAX_RADIUS as f32);
    let mut accumulator = vec![0u32; w as usize * h as usize];
    let mut edge_points = Vec::new();

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        edge_points.push((x as f32, y as f32));
        let (dx, dy) = (gx.get(x, y), gy.get(x, y));
        let norm = dx.hypot(dy);
        if norm == 0.0 {
            continue;
        }
        let (ux, uy) = (dx / norm, dy / norm);
        for sign in [-1.0f32, 1.0] {
            let mut r = min_r;
            while r <= max_r {
                let cx = (x as f32 + sign * ux * r).round();
                let cy = (y as f32 + sign * uy * r).round();
                if cx < 0.0 || cy < 0.0 || cx >= w as f32 || cy >= h as f32 {
                    break;
                }
                accumulator[cy as usize * w as usize + cx as usize] += 1;
                r += 1.0;
            }
        }
    }

    // Rounded votes scatter over neighbouring cells; score each centre by its 3x3 sum
    let cell = |x: i64, y: i64| -> u32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0
        } else {
            accumulator[y as usize * w as usize + x as usize]
        }
    };
    let mut pooled = vec![0u32; accumulator.len()];
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            pooled[y as usize * w as usize + x as usize] = (-1..=1)
                .flat_map(|oy| (-1..=1).map(move |ox| (ox, oy)))
                .map(|(ox, oy)| cell(x + ox, y + oy))
                .sum();
        }
    }
    let at = |x: i64, y: i64| -> u32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0
        } else {
            pooled[y as usize * w as usize + x as usize]
        }
    };
    let mut candidates = Vec::new();
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let votes = at(x, y);
            if votes <= ops::CIRCLE_ACCUMULATOR {
                continue;
            }
            let is_peak = (-1..=1).all(|oy| {
                (-1..=1).all(|ox| (ox == 0 && oy == 0) || at(x + ox, y + oy) <= votes)
            });
            if is_peak {
                candidates.push((votes, x as u32, y as u32));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.2.cmp(&b.2)).then(a.1.cmp(&b.1)));

    let mut circles: Vec<Circle> = Vec::new();
    let mut histogram = vec![0u32; ops::CIRCLE_MAX_RADIUS as usize + 2];
    for (_, cx, cy) in candidates {
        let too_close = circles.iter().any(|c| {
            let (dx, dy) = (c.x as f32 - cx as f32, c.y as f32 - cy as f32);
            dx.hypot(dy) < ops::CIRCLE_MIN_DIST
        });
        if too_close {
            continue;
        }

        histogram.iter_mut().for_each(|v| *v = 0);
        for &(ex, ey) in &edge_points {
            let d = (ex - cx as f32).hypot(ey - cy as f32).round();
            if d >= min_r && d <= max_r {
                histogram[d as usize] += 1;
            }
        }
        let best = (ops::CIRCLE_MIN_RADIUS as usize..=ops::CIRCLE_MAX_RADIUS as usize)
            .max_by_key(|&r| (histogram[r - 1] + histogram[r] + histogram[r + 1], usize::MAX - r));
        if let Some(r) = best {
            let support = histogram[r - 1] + histogram[r] + histogram[r + 1];
            if support > ops::CIRCLE_ACCUMULATOR {
                circles.push(Circle {
                    x: cx,
                    y: cy,
                    radius: r as u32,
                });
            }
        }
    }
    debug!(count = circles.len(), "Circles found");
    circles
}

/// Circles outlined in green with their centres in blue
pub fn hough_circles(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for circle in find_circles(&rgb_to_gray(image)) {
        let center = (circle.x as i32, circle.y as i32);
        draw::circle(&mut out, center, circle.radius as i32, draw::GREEN, 2);
        draw::disc(&mut out, center, 2, draw::BLUE);
    }
    out
}

/// A line segment in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl Segment {
    pub fn length(&self) -> f32 {
        (self.end.0 - self.start.0).hypot(self.end.1 - self.start.1)
    }
}

/// Edge-supported segments of one infinite Hough line
///
/// Walks the line one pixel at a time along its dominant axis. A run of edge
/// pixels continues across gaps of at most `max_gap` and is kept when it
/// spans at least `min_length`.
pub fn line_segments(edges: &GrayImage, line: &PolarLine, min_length: f32, max_gap: u32) -> Vec<Segment> {
    let (w, h) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (cos, sin) = (theta.cos(), theta.sin());
    let steep = sin.abs() < cos.abs();

    let is_edge = |x: f32, y: f32| -> bool {
        let (xi, yi) = (x.round() as i64, y.round() as i64);
        // One pixel of tolerance across the line
        let across: [(i64, i64); 3] = if steep {
            [(0, 0), (-1, 0), (1, 0)]
        } else {
            [(0, 0), (0, -1), (0, 1)]
        };
        across.iter().any(|&(ox, oy)| {
            let (px, py) = (xi + ox, yi + oy);
            px >= 0
                && py >= 0
                && px < w as i64
                && py < h as i64
                && edges.get_pixel(px as u32, py as u32).0[0] > 0
        })
    };

    let points: Vec<(f32, f32)> = if steep {
        (0..h)
            .map(|y| {
                let y = y as f32;
                ((line.r - y * sin) / cos, y)
            })
            .collect()
    } else {
        (0..w)
            .map(|x| {
                let x = x as f32;
                (x, (line.r - x * cos) / sin)
            })
            .collect()
    };

    let mut segments = Vec::new();
    let mut run: Option<((f32, f32), (f32, f32))> = None;
    let mut gap = 0u32;
    let close = |run: &mut Option<((f32, f32), (f32, f32))>, segments: &mut Vec<Segment>| {
        if let Some((start, end)) = run.take() {
            let segment = Segment { start, end };
            if segment.length() >= min_length {
                segments.push(segment);
            }
        }
    };

    for &(x, y) in &points {
        let inside = x >= 0.0 && y >= 0.0 && x <= (w - 1) as f32 && y <= (h - 1) as f32;
        if inside && is_edge(x, y) {
            run = Some(match run {
                Some((start, _)) => (start, (x, y)),
                None => ((x, y), (x, y)),
            });
            gap = 0;
        } else if run.is_some() {
            gap += 1;
            if gap > max_gap {
                close(&mut run, &mut segments);
                gap = 0;
            }
        }
    }
    close(&mut run, &mut segments);
    segments
}

/// Segments of all Hough lines in a Canny edge map
pub fn find_segments(edges: &GrayImage) -> Vec<Segment> {
    let options = LineDetectionOptions {
        vote_threshold: ops::LINES_THRESHOLD,
        suppression_radius: 8,
    };
    let lines = detect_lines(edges, options);
    debug!(line_count = lines.len(), "Hough lines detected");
    lines
        .iter()
        .flat_map(|line| line_segments(edges, line, ops::LINES_MIN_LENGTH, ops::LINES_MAX_GAP))
        .collect()
}

pub(super) fn hough_line_panels(input: &Frame) -> AppResult<OperationOutput> {
    let rgb = input.to_rgb();
    let edges = imageproc::edges::canny(
        &rgb_to_gray(&rgb),
        ops::LINES_CANNY_LOW,
        ops::LINES_CANNY_HIGH,
    );
    let segments = find_segments(&edges);

    let mut annotated = rgb.clone();
    for segment in &segments {
        draw::line(&mut annotated, segment.start, segment.end, draw::GREEN, 2);
    }
    let note = segments.is_empty().then(|| "No lines found".to_string());

    Ok(OperationOutput::Panels {
        panels: vec![
            Panel::new("Original", Frame::color(rgb)?),
            Panel::new("Canny Edges", Frame::gray(edges)?),
            Panel::new("Detected Lines", Frame::color(annotated)?),
        ],
        note,
    })
}

/// Harris response with 3x3 Sobel gradients over a 2x2 block
pub fn harris_response(gray: &GrayImage) -> Plane {
    let (gx, gy) = sobel_xy(&Plane::from_gray(gray), ops::HARRIS_KSIZE);
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let block = ops::HARRIS_BLOCK as i64;
    let clamp = |v: i64, n: i64| v.clamp(0, n - 1) as u32;

    let mut response = Plane::new(gray.width(), gray.height());
    for y in 0..h {
        for x in 0..w {
            let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
            for by in 0..block {
                for bx in 0..block {
                    let (px, py) = (clamp(x + bx - block / 2, w), clamp(y + by - block / 2, h));
                    let (dx, dy) = (gx.get(px, py), gy.get(px, py));
                    sxx += dx * dx;
                    syy += dy * dy;
                    sxy += dx * dy;
                }
            }
            let det = sxx * syy - sxy * sxy;
            let trace = sxx + syy;
            response.set(x as u32, y as u32, det - ops::HARRIS_K * trace * trace);
        }
    }
    response
}

/// Pixels whose dilated Harris response exceeds 1% of the maximum, painted blue
pub fn harris_corners(image: &RgbImage) -> RgbImage {
    let response = harris_response(&rgb_to_gray(image));
    let (w, h) = (response.width, response.height);
    let max = response.data.iter().copied().fold(f32::MIN, f32::max);
    let threshold = ops::HARRIS_RATIO * max;

    let mut out = image.clone();
    if max <= 0.0 {
        return out;
    }
    for y in 0..h {
        for x in 0..w {
            let dilated = (y.saturating_sub(1)..=(y + 1).min(h - 1))
                .flat_map(|ny| (x.saturating_sub(1)..=(x + 1).min(w - 1)).map(move |nx| (nx, ny)))
                .map(|(nx, ny)| response.get(nx, ny))
                .fold(f32::MIN, f32::max);
            if dilated > threshold {
                out.put_pixel(x, y, draw::BLUE);
            }
        }
    }
    out
}

/// Hue in 0..180, saturation and value in 0..255
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;
    let s = if v > 0.0 { delta / v * 255.0 } else { 0.0 };
    let mut hue = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    [
        (hue / 2.0).round().min(179.0) as u8,
        s.round() as u8,
        v as u8,
    ]
}

/// Keep pixels inside the green HSV band, black out the rest
pub fn green_ball_mask(image: &RgbImage) -> RgbImage {
    let (lower, upper) = (ops::BALL_LOWER, ops::BALL_UPPER);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let hsv = rgb_to_hsv(pixel);
        let inside = (0..3).all(|c| hsv[c] >= lower[c] && hsv[c] <= upper[c]);
        if !inside {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use image::Luma;

    #[test]
    fn test_faces_need_cascades() {
        let image = RgbImage::new(8, 8);
        let err = faces_and_eyes(&image, &OpContext::default()).unwrap_err();
        assert_eq!(err, AppError::Precondition(PreconditionError::CascadesMissing));
    }

    #[test]
    fn test_hsv_matches_reference_values() {
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([128, 128, 128])), [0, 0, 128]);
    }

    #[test]
    fn test_green_ball_mask_keeps_only_green() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([200, 30, 30]));
        image.put_pixel(1, 0, Rgb([30, 200, 30]));
        let out = green_ball_mask(&image);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [30, 200, 30]);
    }

    #[test]
    fn test_circle_found_near_true_centre() {
        let mut gray = GrayImage::from_pixel(120, 120, Luma([0]));
        imageproc::drawing::draw_filled_circle_mut(&mut gray, (60, 58), 30, Luma([255]));
        let circles = find_circles(&gray);
        assert!(!circles.is_empty(), "no circle detected");
        let c = circles[0];
        assert!((c.x as i32 - 60).abs() <= 2 && (c.y as i32 - 58).abs() <= 2, "{:?}", c);
        assert!((c.radius as i32 - 30).abs() <= 2, "{:?}", c);
    }

    #[test]
    fn test_circles_found_across_radii_and_sizes() {
        let cases = [
            (120u32, 15i32),
            (120, 20),
            (120, 40),
            (200, 50),
            (200, 70),
            (300, 90),
        ];
        for (size, r) in cases {
            let centre = (size as i32 / 2, size as i32 / 2 + 1);
            let mut gray = GrayImage::from_pixel(size, size, Luma([0]));
            imageproc::drawing::draw_filled_circle_mut(&mut gray, centre, r, Luma([255]));
            let circles = find_circles(&gray);
            let hit = circles.iter().any(|c| {
                (c.x as i32 - centre.0).abs() <= 2
                    && (c.y as i32 - centre.1).abs() <= 2
                    && (c.radius as i32 - r).abs() <= 2
            });
            assert!(hit, "size {} radius {}: {:?}", size, r, circles);
        }
    }

    #[test]
    fn test_blank_image_has_no_circles() {
        let gray = GrayImage::from_pixel(80, 80, Luma([90]));
        assert!(find_circles(&gray).is_empty());
    }

    #[test]
    fn test_segments_follow_horizontal_edge_with_gap() {
        let mut edges = GrayImage::new(100, 20);
        for x in (10..90).filter(|x| !(40..45).contains(x)) {
            edges.put_pixel(x, 10, Luma([255]));
        }
        // Normal at 90 degrees: y = r
        let line = PolarLine {
            r: 10.0,
            angle_in_degrees: 90,
        };
        let segments = line_segments(&edges, &line, 50.0, 10);
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start.0 - 10.0).abs() < 0.5);
        assert!((segments[0].end.0 - 89.0).abs() < 0.5);

        // Both halves are shorter than the minimum once the gap splits them
        let split = line_segments(&edges, &line, 50.0, 2);
        assert!(split.is_empty(), "{:?}", split);
    }

    #[test]
    fn test_harris_marks_square_corners() {
        let image = RgbImage::from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let out = harris_corners(&image);
        let near_corner = (8..13)
            .flat_map(|y| (8..13).map(move |x| (x, y)))
            .any(|(x, y)| out.get_pixel(x, y) == &draw::BLUE);
        assert!(near_corner);
        assert_ne!(out.get_pixel(20, 20), &draw::BLUE);
    }
}
