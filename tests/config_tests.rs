// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use vislab::Config;
use vislab::config::AppTheme;
use vislab::constants::{RecordingCodec, cascades, preview};
use vislab::storage::OutputDirs;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.app_theme, AppTheme::System);
    assert_eq!(config.camera_device, None, "Camera should be picked automatically");
    assert_eq!(config.output_dir, None);
    assert_eq!(config.recording_codec, RecordingCodec::Mpeg4);
    assert_eq!(config.preview_size, preview::STILL_MAX);
    assert_eq!(config.live_preview_size, preview::LIVE_MAX);
}

#[test]
fn test_cascade_path_follows_config() {
    let mut config = Config::default();
    assert_eq!(config.cascade_path(), std::path::PathBuf::from(cascades::DEFAULT_DIR));

    config.cascade_dir = "/opt/models".to_string();
    assert_eq!(config.cascade_path(), std::path::PathBuf::from("/opt/models"));
}

#[test]
fn test_output_override_wins() {
    let config = Config {
        output_dir: Some("/tmp/vislab-out".into()),
        ..Config::default()
    };
    assert_eq!(
        OutputDirs::resolve(&config).root(),
        std::path::Path::new("/tmp/vislab-out")
    );
}

#[test]
fn test_output_defaults_to_working_directory() {
    let config = Config::default();
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(OutputDirs::resolve(&config).root(), cwd.as_path());
}

#[test]
fn test_config_serde_round_trip() {
    let config = Config {
        camera_device: Some("/dev/video2".to_string()),
        recording_codec: RecordingCodec::Mjpeg,
        app_theme: AppTheme::Dark,
        ..Config::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
