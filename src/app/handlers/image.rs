// SPDX-License-Identifier: GPL-3.0-only

//! Still image handlers
//!
//! Handles the file dialog, image decoding, reset and export of the
//! processed image.

use crate::app::state::{AppModel, Banner, Message};
use crate::backends::load_image;
use crate::constants::files;
use crate::errors::{AppResult, OperationError};
use crate::fl;
use crate::media::Frame;
use crate::pipelines::photo;
use cosmic::Task;
use std::path::PathBuf;
use tracing::info;

impl AppModel {
    pub(crate) fn handle_load_image(&mut self) -> Task<cosmic::Action<Message>> {
        if self.busy.is_some() {
            return Task::none();
        }
        let title = fl!("open-image");
        let filter = fl!("image-files");
        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .set_title(title)
                    .add_filter(filter, files::IMAGE_EXTENSIONS)
                    .pick_file()
                    .await
                    .map(|handle| handle.path().to_path_buf())
            },
            |path| cosmic::Action::App(Message::ImagePicked(path)),
        )
    }

    pub(crate) fn handle_image_picked(
        &mut self,
        path: Option<PathBuf>,
    ) -> Task<cosmic::Action<Message>> {
        let Some(path) = path else {
            return Task::none();
        };
        info!(path = %path.display(), "Image selected");
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || load_image(&path))
                    .await
                    .map_err(|e| OperationError::Interrupted(e.to_string()))?
            },
            |result| cosmic::Action::App(Message::ImageLoaded(result)),
        )
    }

    pub(crate) fn handle_image_loaded(
        &mut self,
        result: AppResult<Frame>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(frame) => {
                self.session.load_image(frame);
                self.results = None;
                self.prompt = None;
                self.banner = None;
                self.refresh_panes();
            }
            Err(err) => self.report_error("Failed to load image", err),
        }
        Task::none()
    }

    pub(crate) fn handle_reset_image(&mut self) -> Task<cosmic::Action<Message>> {
        match self.session.reset() {
            Ok(()) => {
                self.results = None;
                self.refresh_panes();
            }
            Err(err) => self.report_error("Reset failed", err),
        }
        Task::none()
    }

    pub(crate) fn handle_save_result(&mut self) -> Task<cosmic::Action<Message>> {
        let frame = match self.session.processed_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.report_error("Nothing to save", err);
                return Task::none();
            }
        };
        let outputs = self.session.outputs().clone();
        Task::perform(
            photo::save_frame_async(frame, outputs, files::PROCESSED_PREFIX),
            |result| cosmic::Action::App(Message::ResultSaved(result)),
        )
    }

    pub(crate) fn handle_result_saved(
        &mut self,
        result: AppResult<PathBuf>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(path) => {
                self.banner = Some(Banner::info(fl!(
                    "saved-to",
                    path = path.display().to_string()
                )));
            }
            Err(err) => self.report_error("Failed to save result", err),
        }
        Task::none()
    }
}
