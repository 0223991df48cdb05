// SPDX-License-Identifier: MPL-2.0

//! Cascade discovery and face detection through the public API

use image::{Rgb, RgbImage};
use std::path::PathBuf;
use vislab::constants::cascades;
use vislab::detect::{CascadeStatus, FaceDetector};
use vislab::ops::{OpContext, Operation, OperationOutput};
use vislab::Frame;

const EDGE_CASCADE: &str = include_str!("fixtures/edge_cascade.xml");

fn cascade_dir(name: &str, face: &str, eye: Option<&str>) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vislab-cascades-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(cascades::FACE_FILE), face).unwrap();
    if let Some(eye) = eye {
        std::fs::write(dir.join(cascades::EYE_FILE), eye).unwrap();
    }
    dir
}

#[test]
fn test_check_reports_each_file() {
    let dir = cascade_dir("check", EDGE_CASCADE, None);
    let report = FaceDetector::check(&dir);

    assert_eq!(report.len(), 2);
    assert_eq!(report[0].0, dir.join(cascades::FACE_FILE));
    assert_eq!(
        report[0].1,
        CascadeStatus::Loaded {
            stages: 1,
            window: (6, 6)
        }
    );
    assert_eq!(report[1].1, CascadeStatus::Missing);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_invalid_eye_model_disables_detection() {
    let dir = cascade_dir("invalid", EDGE_CASCADE, Some("<opencv_storage></opencv_storage>"));
    assert!(matches!(FaceDetector::check(&dir)[1].1, CascadeStatus::Invalid(_)));
    assert!(FaceDetector::load(&dir).is_none());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_faces_operation_keeps_size() {
    let dir = cascade_dir("run", EDGE_CASCADE, Some(EDGE_CASCADE));
    let detector = FaceDetector::load(&dir).expect("both models load");
    let ctx = OpContext {
        detector: Some(std::sync::Arc::new(detector)),
    };

    let input = Frame::color(RgbImage::from_fn(64, 48, |x, _| {
        if x < 32 { Rgb([230, 230, 230]) } else { Rgb([20, 20, 20]) }
    }))
    .unwrap();
    match Operation::FacesEyes.run(&input, &ctx).unwrap() {
        OperationOutput::Single(frame) => assert_eq!(frame.dimensions(), (64, 48)),
        other => panic!("expected a frame, got {other:?}"),
    }
    let _ = std::fs::remove_dir_all(dir);
}
