// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{RecordingCodec, app_info, cascades, preview};
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use cosmic::{Theme, theme};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, warn};

/// Application theme preference
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum AppTheme {
    /// Follow system theme (dark or light based on system setting)
    #[default]
    System,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

impl AppTheme {
    pub const ALL: [AppTheme; 3] = [AppTheme::System, AppTheme::Dark, AppTheme::Light];

    /// Get the COSMIC theme for this app theme preference
    pub fn theme(&self) -> Theme {
        match self {
            Self::Dark => {
                let mut theme = theme::system_dark();
                theme.theme_type.prefer_dark(Some(true));
                theme
            }
            Self::Light => {
                let mut theme = theme::system_light();
                theme.theme_type.prefer_dark(Some(false));
                theme
            }
            Self::System => theme::system_preference(),
        }
    }
}

/// Environment-level preferences. Processing parameters are never persisted.
#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Application theme preference (System, Dark, Light)
    pub app_theme: AppTheme,
    /// Camera device path; `None` picks the system default source
    pub camera_device: Option<String>,
    /// Where snapshots, recordings and exports go; `None` = working directory
    pub output_dir: Option<PathBuf>,
    /// Directory holding the Haar cascade XML files
    pub cascade_dir: String,
    /// Codec for recordings
    pub recording_codec: RecordingCodec,
    /// Maximum edge of the still panes
    pub preview_size: u32,
    /// Maximum edge of the live pane
    pub live_preview_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_theme: AppTheme::default(),
            camera_device: None,
            output_dir: None,
            cascade_dir: cascades::DEFAULT_DIR.to_string(),
            recording_codec: RecordingCodec::default(),
            preview_size: preview::STILL_MAX,
            live_preview_size: preview::LIVE_MAX,
        }
    }
}

impl Config {
    /// Read the persisted configuration, returning the handle for later writes
    pub fn load() -> (Option<cosmic_config::Config>, Self) {
        match cosmic_config::Config::new(app_info::APP_ID, Self::VERSION) {
            Ok(handler) => {
                let config = match Self::get_entry(&handler) {
                    Ok(config) => config,
                    Err((errors, config)) => {
                        warn!(?errors, "Errors loading config");
                        config
                    }
                };
                (Some(handler), config)
            }
            Err(err) => {
                error!(%err, "Failed to create config handler");
                (None, Self::default())
            }
        }
    }

    /// Cascade directory as a path
    pub fn cascade_path(&self) -> PathBuf {
        PathBuf::from(&self.cascade_dir)
    }
}
