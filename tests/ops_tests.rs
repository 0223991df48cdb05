// SPDX-License-Identifier: MPL-2.0

//! Operation table checks against a synthetic scene

use image::{Rgb, RgbImage};
use vislab::Frame;
use vislab::errors::{AppError, OperationError};
use vislab::ops::{
    OpContext, Operation, OperationCategory, OperationKind, OperationOutput, Requirement,
};

/// Gray gradient with a green disc and a bright bar
fn scene() -> Frame {
    Frame::color(RgbImage::from_fn(64, 48, |x, y| {
        let (dx, dy) = (x as i32 - 40, y as i32 - 24);
        if dx * dx + dy * dy < 100 {
            Rgb([30, 200, 40])
        } else if (8..12).contains(&x) {
            Rgb([250, 250, 250])
        } else {
            let v = (x * 2 + y) as u8;
            Rgb([v, v, v])
        }
    }))
    .unwrap()
}

#[test]
fn test_every_kind_has_a_category_button() {
    let total: usize = OperationCategory::ALL.iter().map(|c| c.kinds().count()).sum();
    assert_eq!(total, OperationKind::ALL.len());
}

#[test]
fn test_default_operations_run() {
    let input = scene();
    let ctx = OpContext::default();
    for kind in OperationKind::ALL {
        if kind == OperationKind::FacesEyes {
            continue;
        }
        let Some(operation) = Operation::with_defaults(kind) else {
            assert!(
                matches!(kind.requirement(), Requirement::Tool(_)),
                "{kind:?} should have defaults"
            );
            continue;
        };
        let output = operation
            .run(&input, &ctx)
            .unwrap_or_else(|e| panic!("{} failed: {e}", kind.id()));
        if let OperationOutput::Panels { panels, .. } = output {
            assert!(!panels.is_empty(), "{} returned no panels", kind.id());
        }
    }
}

#[test]
fn test_log_transform_is_gray() {
    match Operation::LogTransform.run(&scene(), &OpContext::default()).unwrap() {
        OperationOutput::Single(frame) => assert!(frame.is_gray()),
        other => panic!("expected a frame, got {other:?}"),
    }
}

#[test]
fn test_zoom_scales_dimensions() {
    let output = Operation::Zoom { factor: 0.5 }
        .run(&scene(), &OpContext::default())
        .unwrap();
    match output {
        OperationOutput::Single(frame) => assert_eq!(frame.dimensions(), (32, 24)),
        other => panic!("expected a frame, got {other:?}"),
    }
}

#[test]
fn test_out_of_range_parameters_are_rejected() {
    let err = Operation::from_values(OperationKind::Zoom, &[50.0]).unwrap_err();
    assert!(matches!(
        err,
        AppError::Operation(OperationError::InvalidParameter(_))
    ));
    assert!(Operation::from_values(OperationKind::Translation, &[1.5, 0.0]).is_err());
}

#[test]
fn test_even_blur_kernel_is_made_odd() {
    assert_eq!(
        Operation::from_values(OperationKind::GaussianBlur, &[4.0]).unwrap(),
        Operation::GaussianBlur { ksize: 5 }
    );
}
