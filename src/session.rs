// SPDX-License-Identifier: MPL-2.0

//! Workbench session state
//!
//! One [`Session`] owns everything the user works on: the loaded original,
//! the latest processed result, the live camera and its adjustment pipeline,
//! an optional recording and the active interactive tool. The GUI, the
//! terminal viewer and the CLI all drive the same type.
//!
//! Invariants:
//! - a recording only exists while the camera is open
//! - starting the camera drops the loaded still image
//! - loading an image stops the camera (and any recording)
//! - operations always read the original, never the processed image

use crate::backends::FrameSource;
use crate::constants::{files, recording};
use crate::detect::FaceDetector;
use crate::errors::{AppError, AppResult, PreconditionError, RecordingError};
use crate::media::Frame;
use crate::ops::{OpContext, Operation, OperationOutput, PreviewKind, ToolKind};
use crate::pipelines::adjust::{AdjustmentSettings, LivePipeline};
use crate::pipelines::photo;
use crate::pipelines::video::FrameSink;
use crate::storage::OutputDirs;
use crate::tools::{PreviewTool, ToolMode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens a recording sink: `(path, width, height, fps)`
pub type SinkOpener<'a> = dyn FnOnce(&Path, u32, u32, i32) -> AppResult<Box<dyn FrameSink>> + 'a;

pub struct Session {
    original: Option<Frame>,
    processed: Option<Frame>,
    camera: Option<Box<dyn FrameSource>>,
    recorder: Option<Box<dyn FrameSink>>,
    live: LivePipeline,
    settings: AdjustmentSettings,
    detector: Option<Arc<FaceDetector>>,
    outputs: OutputDirs,
    tool: Option<ToolMode>,
    frames: u64,
    /// Bumped whenever the original is replaced or dropped
    generation: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_original", &self.original.is_some())
            .field("has_processed", &self.processed.is_some())
            .field("camera", &self.camera.as_ref().map(|c| c.name().to_string()))
            .field("recording", &self.recorder.as_ref().map(|r| r.path().to_path_buf()))
            .field("settings", &self.settings)
            .field("cascades_loaded", &self.detector.is_some())
            .field("outputs", &self.outputs)
            .finish()
    }
}

impl Session {
    pub fn new(outputs: OutputDirs, detector: Option<FaceDetector>) -> Self {
        Self {
            original: None,
            processed: None,
            camera: None,
            recorder: None,
            live: LivePipeline::new(),
            settings: AdjustmentSettings::default(),
            detector: detector.map(Arc::new),
            outputs,
            tool: None,
            frames: 0,
            generation: 0,
        }
    }

    /// Identifies the current original; results computed from an older one
    /// are stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn original(&self) -> Option<&Frame> {
        self.original.as_ref()
    }

    pub fn processed(&self) -> Option<&Frame> {
        self.processed.as_ref()
    }

    pub fn is_camera_active(&self) -> bool {
        self.camera.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn camera_name(&self) -> Option<&str> {
        self.camera.as_deref().map(|c| c.name())
    }

    /// Path of the running recording
    pub fn recording_path(&self) -> Option<&Path> {
        self.recorder.as_deref().map(|r| r.path())
    }

    /// Latest adjusted camera frame
    pub fn live_frame(&self) -> Option<&Frame> {
        self.live.last_frame()
    }

    pub fn settings(&self) -> &AdjustmentSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AdjustmentSettings) {
        self.settings = settings.clamped();
    }

    pub fn cascades_loaded(&self) -> bool {
        self.detector.is_some()
    }

    pub fn outputs(&self) -> &OutputDirs {
        &self.outputs
    }

    pub fn set_outputs(&mut self, outputs: OutputDirs) {
        self.outputs = outputs;
    }

    pub fn op_context(&self) -> OpContext {
        OpContext {
            detector: self.detector.clone(),
        }
    }

    // ---------------------------------------------------------------
    // Still images
    // ---------------------------------------------------------------

    /// Make `frame` the original and the processed image
    pub fn load_image(&mut self, frame: Frame) {
        if self.is_camera_active()
            && let Err(e) = self.stop_camera()
        {
            warn!(error = %e, "Stopping camera before loading image failed");
        }
        info!(
            width = frame.width(),
            height = frame.height(),
            "Image loaded"
        );
        self.processed = Some(frame.clone());
        self.original = Some(frame);
        self.tool = None;
        self.generation += 1;
    }

    /// Discard processing and show the original again
    pub fn reset(&mut self) -> AppResult<()> {
        let original = self.original.as_ref().ok_or(PreconditionError::NoImageLoaded)?;
        self.processed = Some(original.clone());
        debug!("Processed image reset to original");
        Ok(())
    }

    /// Copy of the original an operation should run against
    pub fn operation_input(&self) -> AppResult<Frame> {
        self.original
            .clone()
            .ok_or_else(|| PreconditionError::NoImageLoaded.into())
    }

    /// Store the result of an operation; panels leave the processed image alone
    pub fn accept(&mut self, output: &OperationOutput) {
        if let OperationOutput::Single(frame) = output {
            self.processed = Some(frame.clone());
        }
    }

    /// Store a result computed on a worker from the original of `generation`
    ///
    /// Returns false and drops the output when the original was replaced or
    /// dropped while it ran.
    pub fn accept_from(&mut self, generation: u64, output: &OperationOutput) -> bool {
        if generation != self.generation || self.original.is_none() {
            debug!(
                generation,
                current = self.generation,
                "Stale operation result dropped"
            );
            return false;
        }
        self.accept(output);
        true
    }

    /// Run an operation on the original and store its result
    pub fn run(&mut self, operation: &Operation) -> AppResult<OperationOutput> {
        let input = self.operation_input()?;
        let output = operation.run(&input, &self.op_context())?;
        self.accept(&output);
        Ok(output)
    }

    /// Save the processed image as `processed_<timestamp>.png`
    pub fn save_processed(&self) -> AppResult<PathBuf> {
        let frame = self.processed_frame()?;
        photo::save_frame(&frame, &self.outputs, files::PROCESSED_PREFIX)
    }

    pub fn processed_frame(&self) -> AppResult<Frame> {
        self.processed
            .clone()
            .ok_or_else(|| PreconditionError::NoImageLoaded.into())
    }

    // ---------------------------------------------------------------
    // Interactive tools
    // ---------------------------------------------------------------

    pub fn tool(&self) -> Option<&ToolMode> {
        self.tool.as_ref()
    }

    pub fn tool_mut(&mut self) -> Option<&mut ToolMode> {
        self.tool.as_mut()
    }

    /// Enter a pointer-driven tool over the original
    pub fn begin_tool(&mut self, kind: ToolKind) -> AppResult<()> {
        let original = self.original.as_ref().ok_or(PreconditionError::NoImageLoaded)?;
        let (w, h) = original.dimensions();
        self.tool = Some(ToolMode::for_tool(kind, w, h));
        debug!(tool = ?kind, "Tool started");
        Ok(())
    }

    /// Enter a slider preview over the original
    pub fn begin_preview(&mut self, kind: PreviewKind) -> AppResult<()> {
        let original = self.original.as_ref().ok_or(PreconditionError::NoImageLoaded)?;
        self.tool = Some(ToolMode::Preview(PreviewTool::new(kind, original)?));
        debug!(preview = ?kind, "Preview started");
        Ok(())
    }

    pub fn cancel_tool(&mut self) {
        if self.tool.take().is_some() {
            debug!("Tool cancelled");
        }
    }

    /// Leave the tool and hand back the operation it collected
    ///
    /// The tool is closed whether or not it produced an operation.
    pub fn take_tool_operation(&mut self) -> AppResult<Operation> {
        let tool = self.tool.take().ok_or(AppError::Cancelled)?;
        tool.confirm()
    }

    /// Confirm the active tool and run its operation
    pub fn confirm_tool(&mut self) -> AppResult<OperationOutput> {
        let operation = self.take_tool_operation()?;
        self.run(&operation)
    }

    // ---------------------------------------------------------------
    // Live camera
    // ---------------------------------------------------------------

    /// Switch to live mode with an opened frame source
    ///
    /// Any loaded still image is discarded. Returns false, dropping `source`,
    /// when a camera is already running.
    pub fn start_camera(&mut self, source: Box<dyn FrameSource>) -> bool {
        if self.camera.is_some() {
            debug!("Camera already active");
            return false;
        }
        info!(camera = source.name(), "Camera started");
        self.original = None;
        self.processed = None;
        self.tool = None;
        self.live.clear();
        self.frames = 0;
        self.generation += 1;
        self.camera = Some(source);
        true
    }

    /// Release the camera, finalizing a running recording first
    ///
    /// Returns the path of the recording that was stopped, if any.
    pub fn stop_camera(&mut self) -> AppResult<Option<PathBuf>> {
        let recording = if self.recorder.is_some() {
            Some(self.stop_recording())
        } else {
            None
        };
        if let Some(camera) = self.camera.take() {
            info!(camera = camera.name(), frames = self.frames, "Camera stopped");
        }
        recording.transpose()
    }

    /// Pull one frame, adjust it and feed the recording
    ///
    /// `Ok(None)` means no new frame was ready or the camera is off. A lost
    /// camera is released and reported as an error.
    pub fn tick(&mut self) -> AppResult<Option<Frame>> {
        let Some(camera) = self.camera.as_mut() else {
            return Ok(None);
        };
        let frame = match camera.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Camera read failed, releasing camera");
                if let Err(stop) = self.stop_camera() {
                    warn!(error = %stop, "Finalizing recording after camera loss failed");
                }
                return Err(e);
            }
        };

        let adjusted = self
            .live
            .process(frame, &self.settings, self.detector.as_deref());
        self.frames += 1;
        if self.frames % crate::constants::timing::FRAME_LOG_INTERVAL == 0 {
            debug!(frames = self.frames, "Live frames processed");
        }

        if let Some(recorder) = self.recorder.as_mut()
            && let Err(e) = recorder.push(&adjusted)
        {
            warn!(error = %e, "Recording failed, stopping");
            if let Some(sink) = self.recorder.take()
                && let Err(stop) = sink.finish()
            {
                warn!(error = %stop, "Finalizing failed recording");
            }
            return Err(e);
        }
        Ok(Some(adjusted))
    }

    /// Begin writing adjusted frames to `recording_<timestamp>.avi`
    ///
    /// The output size follows the most recent adjusted frame.
    pub fn start_recording(&mut self, open: Box<SinkOpener<'_>>) -> AppResult<PathBuf> {
        if self.recorder.is_some() {
            return Err(RecordingError::AlreadyRecording.into());
        }
        if self.camera.is_none() {
            return Err(PreconditionError::CameraNotActive.into());
        }
        let (width, height) = self
            .live
            .last_frame()
            .map(Frame::dimensions)
            .ok_or(PreconditionError::NoFrameAvailable)?;
        let path = self
            .outputs
            .next_path(files::RECORDING_PREFIX, recording::EXTENSION)?;
        let sink = open(&path, width, height, recording::FPS)?;
        info!(path = %path.display(), width, height, "Recording started");
        self.recorder = Some(sink);
        Ok(path)
    }

    /// Finalize the running recording
    pub fn stop_recording(&mut self) -> AppResult<PathBuf> {
        let sink = self.recorder.take().ok_or(RecordingError::NotRecording)?;
        let frames = sink.frame_count();
        let path = sink.finish()?;
        info!(path = %path.display(), frames, "Recording saved");
        Ok(path)
    }

    /// Latest adjusted frame, for saving as a snapshot
    pub fn snapshot_frame(&self) -> AppResult<Frame> {
        if self.camera.is_none() {
            return Err(PreconditionError::CameraNotActive.into());
        }
        self.live
            .last_frame()
            .cloned()
            .ok_or_else(|| PreconditionError::NoFrameAvailable.into())
    }

    /// Save the latest adjusted frame as `snapshot_<timestamp>.png`
    pub fn take_snapshot(&self) -> AppResult<PathBuf> {
        let frame = self.snapshot_frame()?;
        photo::save_frame(&frame, &self.outputs, files::SNAPSHOT_PREFIX)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.recorder.is_some()
            && let Err(e) = self.stop_recording()
        {
            warn!(error = %e, "Finalizing recording on shutdown failed");
        }
    }
}
