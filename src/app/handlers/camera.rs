// SPDX-License-Identifier: GPL-3.0-only

//! Camera handlers
//!
//! Handles camera start/stop, the live tick, adjustment controls,
//! recording and snapshots.

use crate::app::state::{AppModel, Banner, Message, OpenedCamera};
use crate::backends::{CameraDevice, FrameSource, GstCamera};
use crate::constants::files;
use crate::errors::{AppResult, CameraError, PreconditionError};
use crate::fl;
use crate::pipelines::adjust::AdjustmentSettings;
use crate::pipelines::photo;
use crate::pipelines::video::{FrameSink, VideoRecorder};
use cosmic::Task;
use std::path::PathBuf;
use tracing::info;

impl AppModel {
    pub(crate) fn handle_cameras_enumerated(
        &mut self,
        cameras: Vec<CameraDevice>,
    ) -> Task<cosmic::Action<Message>> {
        info!(count = cameras.len(), "Cameras enumerated");
        self.available_cameras = cameras;
        self.update_camera_options();
        Task::none()
    }

    /// Open the configured camera on a worker; the UI stays responsive
    pub(crate) fn handle_start_camera(&mut self) -> Task<cosmic::Action<Message>> {
        if self.session.is_camera_active() || self.camera_opening || self.busy.is_some() {
            return Task::none();
        }
        self.camera_opening = true;
        let device = self.config.camera_device.clone();
        info!(device = ?device, "Opening camera");

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    GstCamera::open(device.as_deref())
                        .map(|camera| OpenedCamera::new(Box::new(camera) as Box<dyn FrameSource>))
                })
                .await
                .map_err(|e| CameraError::InitializationFailed(e.to_string()))?
            },
            |result| cosmic::Action::App(Message::CameraOpened(result)),
        )
    }

    pub(crate) fn handle_camera_opened(
        &mut self,
        result: AppResult<OpenedCamera>,
    ) -> Task<cosmic::Action<Message>> {
        self.camera_opening = false;
        match result {
            Ok(opened) => {
                if let Some(source) = opened.take()
                    && self.session.start_camera(source)
                {
                    self.results = None;
                    self.prompt = None;
                    self.banner = None;
                    self.refresh_panes();
                }
            }
            Err(err) => self.report_error("Failed to open camera", err),
        }
        Task::none()
    }

    pub(crate) fn handle_stop_camera(&mut self) -> Task<cosmic::Action<Message>> {
        match self.session.stop_camera() {
            Ok(Some(path)) => {
                self.banner = Some(Banner::info(fl!(
                    "recording-saved",
                    path = path.display().to_string()
                )));
            }
            Ok(None) => {}
            Err(err) => self.report_error("Failed to finalize recording", err),
        }
        self.refresh_panes();
        Task::none()
    }

    pub(crate) fn handle_camera_tick(&mut self) -> Task<cosmic::Action<Message>> {
        match self.session.tick() {
            Ok(Some(frame)) => {
                let max = self.config.live_preview_size;
                self.handles.processed =
                    Some(crate::media::presentation::image_handle(&frame, max));
            }
            Ok(None) => {}
            Err(err) => {
                self.report_error("Live frame failed", err);
                self.refresh_panes();
            }
        }
        Task::none()
    }

    pub(crate) fn handle_toggle_recording(&mut self) -> Task<cosmic::Action<Message>> {
        if self.session.is_recording() {
            match self.session.stop_recording() {
                Ok(path) => {
                    self.banner = Some(Banner::info(fl!(
                        "recording-saved",
                        path = path.display().to_string()
                    )));
                }
                Err(err) => self.report_error("Failed to stop recording", err),
            }
            return Task::none();
        }

        let codec = self.config.recording_codec;
        let started = self
            .session
            .start_recording(Box::new(move |path, width, height, fps| {
                VideoRecorder::start(path, width, height, fps, codec)
                    .map(|recorder| Box::new(recorder) as Box<dyn FrameSink>)
            }));
        match started {
            Ok(path) => {
                self.banner = Some(Banner::info(fl!(
                    "recording-started",
                    path = path.display().to_string()
                )));
            }
            Err(err) => self.report_error("Failed to start recording", err),
        }
        Task::none()
    }

    pub(crate) fn handle_take_snapshot(&mut self) -> Task<cosmic::Action<Message>> {
        let frame = match self.session.snapshot_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.report_error("Snapshot unavailable", err);
                return Task::none();
            }
        };
        let outputs = self.session.outputs().clone();
        Task::perform(
            photo::save_frame_async(frame, outputs, files::SNAPSHOT_PREFIX),
            |result| cosmic::Action::App(Message::SnapshotSaved(result)),
        )
    }

    pub(crate) fn handle_snapshot_saved(
        &mut self,
        result: AppResult<PathBuf>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(path) => {
                self.banner = Some(Banner::info(fl!(
                    "snapshot-saved",
                    path = path.display().to_string()
                )));
            }
            Err(err) => self.report_error("Failed to save snapshot", err),
        }
        Task::none()
    }

    // =========================================================================
    // Live adjustments
    // =========================================================================

    /// Edit the live settings; the session clamps them
    pub(crate) fn adjust(
        &mut self,
        edit: impl FnOnce(&mut AdjustmentSettings),
    ) -> Task<cosmic::Action<Message>> {
        let mut settings = *self.session.settings();
        edit(&mut settings);
        self.session.set_settings(settings);
        Task::none()
    }

    pub(crate) fn handle_toggle_faces(&mut self, on: bool) -> Task<cosmic::Action<Message>> {
        if on && !self.session.cascades_loaded() {
            self.report_error("Face detection unavailable", PreconditionError::CascadesMissing.into());
            return Task::none();
        }
        self.adjust(|s| s.faces = on)
    }
}
