// SPDX-License-Identifier: MPL-2.0

//! Face and eye annotation with Haar cascades
//!
//! The models are the stock OpenCV cascade files, read from a directory at
//! startup. Detection is best-effort: when either file is missing or cannot be
//! parsed, [`FaceDetector::load`] returns `None` and callers skip the step.

pub mod cascade;
pub mod grouping;
pub mod integral;

pub use cascade::{Cascade, CascadeError, DetectParams};
pub use grouping::Region;

use crate::constants::cascades;
use crate::media::draw;
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A detected face and the eyes found inside it (absolute coordinates)
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    pub face: Region,
    pub eyes: Vec<Region>,
}

/// Status of one cascade file, for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeStatus {
    Missing,
    Invalid(CascadeError),
    Loaded { stages: usize, window: (u32, u32) },
}

/// Paired face and eye cascades
#[derive(Debug, Clone)]
pub struct FaceDetector {
    face: Cascade,
    eye: Cascade,
}

impl FaceDetector {
    pub fn new(face: Cascade, eye: Cascade) -> Self {
        Self { face, eye }
    }

    /// Load both models from `dir`. Missing or corrupt files disable detection.
    pub fn load(dir: &Path) -> Option<Self> {
        let face_path = dir.join(cascades::FACE_FILE);
        let eye_path = dir.join(cascades::EYE_FILE);

        if !face_path.exists() || !eye_path.exists() {
            warn!(dir = %dir.display(), "Haar cascade files not found, face detection disabled");
            return None;
        }

        let face = Cascade::load(&face_path)
            .inspect_err(|e| warn!(path = %face_path.display(), error = %e, "Face cascade unusable"))
            .ok()?;
        let eye = Cascade::load(&eye_path)
            .inspect_err(|e| warn!(path = %eye_path.display(), error = %e, "Eye cascade unusable"))
            .ok()?;

        info!(
            face_stages = face.stage_count(),
            eye_stages = eye.stage_count(),
            "Haar cascades loaded"
        );
        Some(Self::new(face, eye))
    }

    /// Check both cascade files without keeping them
    pub fn check(dir: &Path) -> Vec<(PathBuf, CascadeStatus)> {
        [cascades::FACE_FILE, cascades::EYE_FILE]
            .iter()
            .map(|name| {
                let path = dir.join(name);
                let status = if !path.exists() {
                    CascadeStatus::Missing
                } else {
                    match Cascade::load(&path) {
                        Ok(c) => CascadeStatus::Loaded {
                            stages: c.stage_count(),
                            window: c.window_size(),
                        },
                        Err(e) => CascadeStatus::Invalid(e),
                    }
                };
                (path, status)
            })
            .collect()
    }

    /// Find faces, then eyes inside each face
    pub fn detect(&self, gray: &GrayImage, face_scale: f32) -> Vec<FaceDetection> {
        let face_params = DetectParams {
            scale_factor: face_scale,
            min_neighbors: cascades::MIN_NEIGHBORS,
            group_eps: cascades::GROUP_EPS,
        };
        let eye_params = DetectParams {
            scale_factor: cascades::EYE_SCALE_FACTOR,
            min_neighbors: cascades::EYE_MIN_NEIGHBORS,
            group_eps: cascades::GROUP_EPS,
        };

        self.face
            .detect(gray, &face_params)
            .into_iter()
            .filter_map(|face| face.clamp_to(gray.width(), gray.height()))
            .map(|face| {
                let roi = image::imageops::crop_imm(
                    gray,
                    face.x as u32,
                    face.y as u32,
                    face.width as u32,
                    face.height as u32,
                )
                .to_image();
                let eyes = self
                    .eye
                    .detect(&roi, &eye_params)
                    .into_iter()
                    .map(|e| Region {
                        x: e.x + face.x,
                        y: e.y + face.y,
                        ..e
                    })
                    .collect();
                FaceDetection { face, eyes }
            })
            .collect()
    }

    /// Detect on the intensity version of `image` and draw the results in place:
    /// faces red with `face_thickness`, eyes green.
    pub fn annotate(&self, image: &mut RgbImage, face_scale: f32, face_thickness: u32) -> usize {
        let gray = crate::media::frame::rgb_to_gray(image);
        let detections = self.detect(&gray, face_scale);
        for d in &detections {
            draw_region(image, &d.face, draw::RED, face_thickness);
            for eye in &d.eyes {
                draw_region(image, eye, draw::GREEN, cascades::EYE_THICKNESS);
            }
        }
        detections.len()
    }
}

fn draw_region(image: &mut RgbImage, region: &Region, color: image::Rgb<u8>, thickness: u32) {
    draw::rect(
        image,
        region.x,
        region.y,
        region.width.max(0) as u32,
        region.height.max(0) as u32,
        color,
        thickness,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_directory_disables_detection() {
        let dir = std::env::temp_dir().join("vislab-no-cascades-here");
        assert!(FaceDetector::load(&dir).is_none());
        let report = FaceDetector::check(&dir);
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|(_, s)| *s == CascadeStatus::Missing));
    }
}
