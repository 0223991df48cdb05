// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The main `update()` function acts as a dispatcher, while specific handlers
//! are implemented in the `handlers` submodules organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::image`: Loading, resetting and saving still images
//! - `handlers::operations`: Operation dispatch, prompts, results
//! - `handlers::tools`: Crop, mask, watershed and preview modes
//! - `handlers::camera`: Live camera, adjustments, recording, snapshots
//! - `handlers::system`: Settings, banners, external links

use crate::app::state::{AppModel, Message};
use cosmic::Task;

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== UI Navigation =====
            Message::LaunchUrl(url) => self.handle_launch_url(url),
            Message::ToggleContextPage(page) => self.handle_toggle_context_page(page),
            Message::DismissBanner => {
                self.banner = None;
                Task::none()
            }

            // ===== Still images =====
            Message::LoadImage => self.handle_load_image(),
            Message::ImagePicked(path) => self.handle_image_picked(path),
            Message::ImageLoaded(result) => self.handle_image_loaded(result),
            Message::ResetImage => self.handle_reset_image(),
            Message::SaveResult => self.handle_save_result(),
            Message::ResultSaved(result) => self.handle_result_saved(result),

            // ===== Operations =====
            Message::RunOperation(kind) => self.handle_run_operation(kind),
            Message::PromptInput(index, text) => self.handle_prompt_input(index, text),
            Message::PromptSubmit => self.handle_prompt_submit(),
            Message::PromptCancel => self.handle_prompt_cancel(),
            Message::OperationFinished(kind, generation, result) => {
                self.handle_operation_finished(kind, generation, result)
            }
            Message::CloseResults => {
                self.results = None;
                Task::none()
            }

            // ===== Interactive tools =====
            Message::ToolPointerMoved(point) => self.handle_tool_pointer_moved(point),
            Message::ToolPointerPressed => self.handle_tool_pointer_pressed(),
            Message::ToolPointerReleased => self.handle_tool_pointer_released(),
            Message::ToolSlider(index, value) => self.handle_tool_slider(index, value),
            Message::SetMarkerLabel(label) => self.handle_set_marker_label(label),
            Message::ToolClear => self.handle_tool_clear(),
            Message::ToolConfirm => self.handle_tool_confirm(),
            Message::ToolCancel => self.handle_tool_cancel(),

            // ===== Camera =====
            Message::CamerasEnumerated(cameras) => self.handle_cameras_enumerated(cameras),
            Message::StartCamera => self.handle_start_camera(),
            Message::CameraOpened(result) => self.handle_camera_opened(result),
            Message::StopCamera => self.handle_stop_camera(),
            Message::CameraTick => self.handle_camera_tick(),
            Message::ToggleRecording => self.handle_toggle_recording(),
            Message::TakeSnapshot => self.handle_take_snapshot(),
            Message::SnapshotSaved(result) => self.handle_snapshot_saved(result),
            Message::SetContrast(value) => self.adjust(|s| s.contrast = value),
            Message::SetExposure(value) => self.adjust(|s| s.exposure = value),
            Message::SetSharpen(value) => self.adjust(|s| s.sharpen = value),
            Message::ToggleGrayscale(on) => self.adjust(|s| s.grayscale = on),
            Message::ToggleEdges(on) => self.adjust(|s| s.edges = on),
            Message::ToggleFaces(on) => self.handle_toggle_faces(on),
            Message::ToggleFlip(on) => self.adjust(|s| s.flip = on),
            Message::ResetAdjustments => self.adjust(|s| *s = Default::default()),

            // ===== Settings =====
            Message::UpdateConfig(config) => self.handle_update_config(config),
            Message::SetAppTheme(index) => self.handle_set_app_theme(index),
            Message::SelectCamera(index) => self.handle_select_camera(index),
            Message::SelectCodec(index) => self.handle_select_codec(index),
            Message::OpenOutputDirectory => self.handle_open_output_directory(),
        }
    }
}
