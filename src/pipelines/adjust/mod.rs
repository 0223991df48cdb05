// SPDX-License-Identifier: MPL-2.0

//! Live per-frame adjustment pipeline
//!
//! Applied once per camera tick, in a fixed order, each step only when its
//! control deviates from neutral:
//!
//! 1. contrast scale
//! 2. exposure offset
//! 3. unsharp-mask sharpening
//! 4. horizontal flip
//! 5. face/eye annotation (skipped when the cascades are not loaded)
//! 6. edge map, or else grayscale (edges take precedence)
//!
//! The last output is retained so snapshots and recordings can reuse it.

pub mod steps;

use crate::constants::{adjust, cascades};
use crate::detect::FaceDetector;
use crate::media::Frame;
use crate::media::frame::rgb_to_gray;
use serde::{Deserialize, Serialize};

/// Current state of the live sliders and effect toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSettings {
    /// Contrast offset in -100..=100 (scale factor `(100 + c) / 100`)
    pub contrast: i32,
    /// Exposure offset in -100..=100 added to every channel
    pub exposure: i32,
    /// Sharpen amount in 0..=100
    pub sharpen: u32,
    pub flip: bool,
    pub grayscale: bool,
    pub edges: bool,
    pub faces: bool,
}

impl AdjustmentSettings {
    /// True when no step would change a frame
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with every slider value inside its range
    pub fn clamped(self) -> Self {
        Self {
            contrast: self.contrast.clamp(-adjust::OFFSET_LIMIT, adjust::OFFSET_LIMIT),
            exposure: self.exposure.clamp(-adjust::OFFSET_LIMIT, adjust::OFFSET_LIMIT),
            sharpen: self.sharpen.min(adjust::SHARPEN_MAX),
            ..self
        }
    }
}

/// Stateless step sequence plus the retained last output
#[derive(Debug, Default)]
pub struct LivePipeline {
    last: Option<Frame>,
}

impl LivePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all enabled steps on one frame and retain the result
    pub fn process(
        &mut self,
        frame: Frame,
        settings: &AdjustmentSettings,
        detector: Option<&FaceDetector>,
    ) -> Frame {
        let output = apply(frame, &settings.clamped(), detector);
        self.last = Some(output.clone());
        output
    }

    /// Output of the most recent tick
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Apply the adjustment steps without retaining anything
pub fn apply(frame: Frame, settings: &AdjustmentSettings, detector: Option<&FaceDetector>) -> Frame {
    let needs_color = settings.contrast != 0
        || settings.exposure != 0
        || settings.sharpen > 0
        || settings.flip
        || (settings.faces && detector.is_some());

    let frame = if needs_color {
        let mut image = frame.into_rgb();
        if settings.contrast != 0 {
            steps::apply_contrast(&mut image, settings.contrast);
        }
        if settings.exposure != 0 {
            steps::apply_exposure(&mut image, settings.exposure);
        }
        if settings.sharpen > 0 {
            image = steps::apply_sharpen(&image, settings.sharpen);
        }
        if settings.flip {
            steps::apply_flip(&mut image);
        }
        if settings.faces
            && let Some(detector) = detector
        {
            detector.annotate(
                &mut image,
                cascades::LIVE_SCALE_FACTOR,
                cascades::LIVE_FACE_THICKNESS,
            );
        }
        Frame::Color(image)
    } else {
        frame
    };

    if settings.edges {
        let gray = match &frame {
            Frame::Color(img) => rgb_to_gray(img),
            Frame::Gray(img) => img.clone(),
        };
        Frame::Gray(steps::edge_map(&gray))
    } else if settings.grayscale {
        match frame {
            Frame::Color(img) => Frame::Gray(rgb_to_gray(&img)),
            gray => gray,
        }
    } else {
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample() -> Frame {
        Frame::color(RgbImage::from_fn(16, 12, |x, y| {
            Rgb([(x * 15) as u8, (y * 20) as u8, ((x + y) * 7) as u8])
        }))
        .unwrap()
    }

    #[test]
    fn test_neutral_is_identity() {
        let mut pipeline = LivePipeline::new();
        let settings = AdjustmentSettings::default();
        assert!(settings.is_neutral());
        assert_eq!(pipeline.process(sample(), &settings, None), sample());
        assert_eq!(pipeline.last_frame(), Some(&sample()));
    }

    #[test]
    fn test_edges_take_precedence_over_grayscale() {
        let settings = AdjustmentSettings {
            grayscale: true,
            edges: true,
            ..Default::default()
        };
        let out = apply(sample(), &settings, None);
        let Frame::Gray(img) = out else {
            panic!("edge map must be single channel");
        };
        assert!(img.iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_flip_twice_restores_frame() {
        let settings = AdjustmentSettings {
            flip: true,
            ..Default::default()
        };
        let once = apply(sample(), &settings, None);
        assert_ne!(once, sample());
        assert_eq!(apply(once, &settings, None), sample());
    }

    #[test]
    fn test_edges_always_binary_single_channel() {
        let frames = [
            sample(),
            Frame::color(RgbImage::from_pixel(9, 7, Rgb([120, 40, 200]))).unwrap(),
            Frame::color(RgbImage::from_fn(24, 24, |x, y| {
                if (x / 4 + y / 4) % 2 == 0 {
                    Rgb([255, 255, 255])
                } else {
                    Rgb([0, 0, 0])
                }
            }))
            .unwrap(),
            Frame::color(RgbImage::from_fn(31, 17, |x, y| {
                let v = ((x * 37 + y * 91) % 251) as u8;
                Rgb([v, v.wrapping_mul(3), 255 - v])
            }))
            .unwrap(),
        ];
        let variants = [
            AdjustmentSettings {
                edges: true,
                ..Default::default()
            },
            AdjustmentSettings {
                edges: true,
                contrast: 60,
                exposure: -30,
                ..Default::default()
            },
            AdjustmentSettings {
                edges: true,
                sharpen: 80,
                flip: true,
                ..Default::default()
            },
        ];
        for frame in &frames {
            for settings in &variants {
                let out = apply(frame.clone(), settings, None);
                assert_eq!(out.dimensions(), frame.dimensions());
                let Frame::Gray(img) = out else {
                    panic!("edge map must be single channel for {:?}", settings);
                };
                assert!(img.iter().all(|&v| v == 0 || v == 255), "{:?}", settings);
            }
        }
    }

    #[test]
    fn test_faces_without_detector_is_skipped() {
        let settings = AdjustmentSettings {
            faces: true,
            ..Default::default()
        };
        assert_eq!(apply(sample(), &settings, None), sample());
    }

    #[test]
    fn test_clamped_limits_sliders() {
        let s = AdjustmentSettings {
            contrast: 500,
            exposure: -500,
            sharpen: 900,
            ..Default::default()
        }
        .clamped();
        assert_eq!((s.contrast, s.exposure, s.sharpen), (100, -100, 100));
    }
}
