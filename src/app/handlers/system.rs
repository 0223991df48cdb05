// SPDX-License-Identifier: GPL-3.0-only

//! System handlers
//!
//! Handles the context drawer, external links and settings.

use crate::app::state::{AppModel, ContextPage, Message};
use crate::config::{AppTheme, Config};
use crate::constants::RecordingCodec;
use crate::storage::OutputDirs;
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use tracing::{error, info};

impl AppModel {
    // =========================================================================
    // UI Navigation
    // =========================================================================

    pub(crate) fn handle_launch_url(&self, url: String) -> Task<cosmic::Action<Message>> {
        if let Err(err) = open::that_detached(&url) {
            error!(?err, url = %url, "Failed to open url");
        }
        Task::none()
    }

    pub(crate) fn handle_toggle_context_page(
        &mut self,
        context_page: ContextPage,
    ) -> Task<cosmic::Action<Message>> {
        if self.context_page == context_page {
            self.core.window.show_context = !self.core.window.show_context;
        } else {
            self.context_page = context_page;
            self.core.window.show_context = true;
        }
        Task::none()
    }

    // =========================================================================
    // Settings Handlers
    // =========================================================================

    pub(crate) fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        info!("UpdateConfig received");
        let sizes_changed = config.preview_size != self.config.preview_size
            || config.live_preview_size != self.config.live_preview_size;
        self.config = config;
        self.session.set_outputs(OutputDirs::resolve(&self.config));
        if sizes_changed {
            self.refresh_panes();
        }
        Task::none()
    }

    pub(crate) fn handle_set_app_theme(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let Some(&app_theme) = AppTheme::ALL.get(index) else {
            return Task::none();
        };

        info!(?app_theme, "Setting application theme");
        self.config.app_theme = app_theme;
        self.save_config("app theme");

        cosmic::command::set_theme(app_theme.theme())
    }

    /// Index 0 is the automatic source; the choice applies on next camera start
    pub(crate) fn handle_select_camera(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let device = match index {
            0 => None,
            i => match self.available_cameras.get(i - 1) {
                Some(camera) => Some(camera.path.clone()),
                None => return Task::none(),
            },
        };
        info!(?device, "Camera selected");
        self.config.camera_device = device;
        self.save_config("camera selection");
        Task::none()
    }

    pub(crate) fn handle_select_codec(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let Some(&codec) = RecordingCodec::ALL.get(index) else {
            return Task::none();
        };
        info!(codec = codec.display_name(), "Recording codec selected");
        self.config.recording_codec = codec;
        self.save_config("recording codec");
        Task::none()
    }

    pub(crate) fn handle_open_output_directory(&self) -> Task<cosmic::Action<Message>> {
        let dir = self.session.outputs().root();
        info!(path = %dir.display(), "Opening output directory");
        if let Err(e) = open::that(dir) {
            error!(error = %e, path = %dir.display(), "Failed to open output directory");
        }
        Task::none()
    }

    fn save_config(&self, what: &str) {
        if let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, "Failed to save {}", what);
        }
    }
}
