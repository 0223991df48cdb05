// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use vislab::constants::{RecordingCodec, adjust, app_info, files, ops, preview, recording};

#[test]
fn test_codec_elements() {
    assert_eq!(RecordingCodec::Mpeg4.encoder_element(), "avenc_mpeg4");
    assert_eq!(RecordingCodec::Mjpeg.encoder_element(), "jpegenc");
}

#[test]
fn test_fallback_chain_covers_every_codec() {
    for codec in RecordingCodec::ALL {
        let chain = codec.fallback_chain();
        assert_eq!(chain[0], codec);
        assert_eq!(chain.len(), RecordingCodec::ALL.len());
    }
}

#[test]
fn test_recording_parameters() {
    assert_eq!(recording::FPS, 20);
    assert_eq!(recording::EXTENSION, "avi");
}

#[test]
fn test_preview_sizes_ordered() {
    assert!(preview::PANEL_MAX < preview::TOOL_MAX);
    assert!(preview::TOOL_MAX < preview::STILL_MAX);
    assert!(preview::STILL_MAX < preview::LIVE_MAX);
}

#[test]
fn test_slider_ranges() {
    assert_eq!(adjust::OFFSET_LIMIT, 100);
    assert_eq!(adjust::SHARPEN_MAX, 100);
    assert!(ops::KMEANS_MIN <= ops::KMEANS_DEFAULT && ops::KMEANS_DEFAULT <= ops::KMEANS_MAX);
    assert_eq!(ops::BLUR_KSIZE_DEFAULT % 2, 1, "Blur kernel default must be odd");
}

#[test]
fn test_supported_extensions() {
    for ext in ["jpg", "JPEG", "png", "bmp"] {
        assert!(files::is_image_extension(ext), "{ext} should be accepted");
    }
    assert!(!files::is_image_extension("gif"));
}

#[test]
fn test_version_is_stamped() {
    let version = app_info::version();
    assert!(!version.is_empty());
    assert!(!version.starts_with('v'), "tag prefix kept: {}", version);
}
