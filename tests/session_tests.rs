// SPDX-License-Identifier: MPL-2.0

//! Session behaviour with scripted frame sources and in-memory sinks

use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use vislab::app::{PromptOutcome, PromptState};
use vislab::backends::FrameSource;
use vislab::errors::{AppError, AppResult, CameraError, PreconditionError, RecordingError};
use vislab::ops::{Operation, OperationKind, OperationOutput, Requirement, ToolKind};
use vislab::pipelines::adjust::AdjustmentSettings;
use vislab::pipelines::video::FrameSink;
use vislab::storage::OutputDirs;
use vislab::{Frame, Session};

/// Frame source replaying a fixed script
struct ScriptedCamera {
    script: VecDeque<AppResult<Option<Frame>>>,
}

impl ScriptedCamera {
    fn frames(count: usize) -> Box<Self> {
        Box::new(Self {
            script: (0..count).map(|i| Ok(Some(solid(8, 6, i as u8)))).collect(),
        })
    }
}

impl FrameSource for ScriptedCamera {
    fn read_frame(&mut self) -> AppResult<Option<Frame>> {
        self.script.pop_front().unwrap_or(Ok(None))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct SinkLog {
    frames: Vec<(u32, u32)>,
    finished: bool,
}

struct MemorySink {
    path: PathBuf,
    log: Arc<Mutex<SinkLog>>,
}

impl FrameSink for MemorySink {
    fn push(&mut self, frame: &Frame) -> AppResult<()> {
        self.log.lock().unwrap().frames.push(frame.dimensions());
        Ok(())
    }

    fn finish(self: Box<Self>) -> AppResult<PathBuf> {
        self.log.lock().unwrap().finished = true;
        Ok(self.path)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn frame_count(&self) -> u64 {
        self.log.lock().unwrap().frames.len() as u64
    }
}

fn solid(w: u32, h: u32, value: u8) -> Frame {
    Frame::color(RgbImage::from_pixel(w, h, Rgb([value, value, value]))).unwrap()
}

fn temp_outputs(name: &str) -> OutputDirs {
    OutputDirs::new(std::env::temp_dir().join(format!("vislab-{}-{}", name, std::process::id())))
}

fn start_memory_recording(session: &mut Session) -> (AppResult<PathBuf>, Arc<Mutex<SinkLog>>) {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);
    let result = session.start_recording(Box::new(move |path: &Path, _w, _h, fps| {
        assert_eq!(fps, 20);
        Ok(Box::new(MemorySink {
            path: path.to_path_buf(),
            log: sink_log,
        }) as Box<dyn FrameSink>)
    }));
    (result, log)
}

#[test]
fn test_operations_require_an_image() {
    let mut session = Session::new(temp_outputs("noimage"), None);
    let err = session.run(&Operation::Median).unwrap_err();
    assert_eq!(err, AppError::Precondition(PreconditionError::NoImageLoaded));
    assert_eq!(
        session.reset().unwrap_err(),
        AppError::Precondition(PreconditionError::NoImageLoaded)
    );
}

#[test]
fn test_operations_always_read_the_original() {
    let mut session = Session::new(temp_outputs("original"), None);
    session.load_image(solid(20, 10, 50));

    session.run(&Operation::Zoom { factor: 2.0 }).unwrap();
    assert_eq!(session.processed().unwrap().dimensions(), (40, 20));

    // A second zoom starts again from the 20x10 original
    session.run(&Operation::Zoom { factor: 2.0 }).unwrap();
    assert_eq!(session.processed().unwrap().dimensions(), (40, 20));
    assert_eq!(session.original().unwrap().dimensions(), (20, 10));

    session.reset().unwrap();
    assert_eq!(session.processed(), session.original());
}

#[test]
fn test_panels_leave_processed_alone() {
    let mut session = Session::new(temp_outputs("panels"), None);
    session.load_image(solid(16, 16, 90));
    session.run(&Operation::Rotation { degrees: 90.0 }).unwrap();
    let before = session.processed().cloned();

    let output = session.run(&Operation::Sobel).unwrap();
    match output {
        OperationOutput::Panels { panels, .. } => assert_eq!(panels.len(), 3),
        other => panic!("expected panels, got {other:?}"),
    }
    assert_eq!(session.processed().cloned(), before);
}

#[test]
fn test_faces_without_cascades_fails_cleanly() {
    let mut session = Session::new(temp_outputs("faces"), None);
    session.load_image(solid(30, 30, 120));
    let err = session.run(&Operation::FacesEyes).unwrap_err();
    assert_eq!(err, AppError::Precondition(PreconditionError::CascadesMissing));
    assert_eq!(session.processed(), session.original());
}

#[test]
fn test_crop_tool_round_trip() {
    let mut session = Session::new(temp_outputs("crop"), None);
    session.load_image(solid(40, 30, 10));
    session.begin_tool(ToolKind::Crop).unwrap();

    let tool = session.tool_mut().unwrap();
    tool.press((5, 5));
    tool.drag((20, 15));
    tool.release((25, 20));

    let output = session.confirm_tool().unwrap();
    assert!(session.tool().is_none());
    match output {
        OperationOutput::Single(frame) => assert_eq!(frame.dimensions(), (20, 15)),
        other => panic!("expected a frame, got {other:?}"),
    }
}

#[test]
fn test_empty_selection_cancels() {
    let mut session = Session::new(temp_outputs("cancel"), None);
    session.load_image(solid(40, 30, 10));
    session.begin_tool(ToolKind::MaskObject).unwrap();

    assert_eq!(session.confirm_tool().unwrap_err(), AppError::Cancelled);
    assert!(session.tool().is_none());
    assert_eq!(session.processed(), session.original());
}

#[test]
fn test_camera_replaces_still_image() {
    let mut session = Session::new(temp_outputs("camera"), None);
    session.load_image(solid(10, 10, 1));

    assert!(session.start_camera(ScriptedCamera::frames(3)));
    assert!(session.original().is_none());
    assert!(!session.start_camera(ScriptedCamera::frames(1)), "second camera is refused");

    assert!(session.tick().unwrap().is_some());
    assert_eq!(session.live_frame().unwrap().dimensions(), (8, 6));

    session.load_image(solid(10, 10, 1));
    assert!(!session.is_camera_active());
}

#[test]
fn test_tick_applies_adjustments() {
    let mut session = Session::new(temp_outputs("adjust"), None);
    session.start_camera(ScriptedCamera::frames(1));
    session.set_settings(AdjustmentSettings {
        grayscale: true,
        exposure: 500,
        ..Default::default()
    });
    assert_eq!(session.settings().exposure, 100, "settings are clamped");

    let frame = session.tick().unwrap().unwrap();
    assert!(frame.is_gray());
}

#[test]
fn test_camera_loss_releases_camera() {
    let mut session = Session::new(temp_outputs("loss"), None);
    session.start_camera(Box::new(ScriptedCamera {
        script: VecDeque::from([Ok(Some(solid(8, 6, 0))), Err(CameraError::Disconnected.into())]),
    }));
    assert!(session.tick().unwrap().is_some());
    assert_eq!(session.tick().unwrap_err(), AppError::Camera(CameraError::Disconnected));
    assert!(!session.is_camera_active());
}

#[test]
fn test_recording_preconditions() {
    let mut session = Session::new(temp_outputs("rec-pre"), None);
    let (result, _) = start_memory_recording(&mut session);
    assert_eq!(
        result.unwrap_err(),
        AppError::Precondition(PreconditionError::CameraNotActive)
    );

    session.start_camera(ScriptedCamera::frames(1));
    let (result, _) = start_memory_recording(&mut session);
    assert_eq!(
        result.unwrap_err(),
        AppError::Precondition(PreconditionError::NoFrameAvailable)
    );
    assert_eq!(
        session.stop_recording().unwrap_err(),
        AppError::Recording(RecordingError::NotRecording)
    );
}

#[test]
fn test_recording_receives_adjusted_frames() {
    let outputs = temp_outputs("rec");
    let root = outputs.root().to_path_buf();
    let mut session = Session::new(outputs, None);
    session.start_camera(ScriptedCamera::frames(4));
    session.tick().unwrap();

    let (result, log) = start_memory_recording(&mut session);
    let path = result.unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("recording_"));
    assert_eq!(path.extension().unwrap(), "avi");
    assert!(session.is_recording());

    let (again, _) = start_memory_recording(&mut session);
    assert_eq!(
        again.unwrap_err(),
        AppError::Recording(RecordingError::AlreadyRecording)
    );

    session.tick().unwrap();
    session.tick().unwrap();

    // Stopping the camera finalizes the recording
    let stopped = session.stop_camera().unwrap();
    assert_eq!(stopped, Some(path));
    let log = log.lock().unwrap();
    assert_eq!(log.frames, vec![(8, 6), (8, 6)]);
    assert!(log.finished);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_snapshot_writes_png() {
    let outputs = temp_outputs("snap");
    let root = outputs.root().to_path_buf();
    let mut session = Session::new(outputs, None);
    assert_eq!(
        session.take_snapshot().unwrap_err(),
        AppError::Precondition(PreconditionError::CameraNotActive)
    );

    session.start_camera(ScriptedCamera::frames(1));
    assert_eq!(
        session.take_snapshot().unwrap_err(),
        AppError::Precondition(PreconditionError::NoFrameAvailable)
    );
    session.tick().unwrap();

    let path = session.take_snapshot().unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("snapshot_"));
    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (8, 6));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_prompt_kinds_build_operations() {
    let op = Operation::from_values(OperationKind::Translation, &[10.0, -5.0]).unwrap();
    assert_eq!(op, Operation::Translation { dx: 10, dy: -5 });
    assert!(Operation::from_values(OperationKind::KMeans, &[1.0]).is_err());
}

#[test]
fn test_cancelled_prompt_leaves_processed_unchanged() {
    let mut session = Session::new(temp_outputs("prompt-cancel"), None);
    session.load_image(solid(20, 10, 70));
    session.run(&Operation::Zoom { factor: 2.0 }).unwrap();
    let before = session.processed().cloned();

    for kind in OperationKind::ALL {
        let Requirement::Prompt(fields) = kind.requirement() else {
            continue;
        };
        let mut prompt = PromptState::new(kind, fields);
        for input in prompt.inputs.iter_mut() {
            *input = "3".to_string();
        }
        assert_eq!(prompt.cancel(), AppError::Cancelled);
        assert_eq!(session.processed().cloned(), before, "{:?}", kind);
    }
}

#[test]
fn test_invalid_prompt_input_keeps_dialog_open() {
    let mut prompt = PromptState::new(OperationKind::Zoom, OperationKind::Zoom.fields());
    prompt.inputs[0] = "0.01".to_string();
    assert!(matches!(prompt.submit(), PromptOutcome::Invalid));
    assert!(prompt.error.is_some());

    prompt.inputs[0] = "abc".to_string();
    assert!(matches!(prompt.submit(), PromptOutcome::Invalid));

    prompt.inputs[0] = "2".to_string();
    match prompt.submit() {
        PromptOutcome::Run(op) => assert_eq!(op, Operation::Zoom { factor: 2.0 }),
        other => panic!("expected an operation, got {other:?}"),
    }
}

#[test]
fn test_result_for_replaced_image_is_dropped() {
    let mut session = Session::new(temp_outputs("stale"), None);
    session.load_image(solid(12, 12, 40));
    let generation = session.generation();
    let input = session.operation_input().unwrap();
    let output = Operation::Zoom { factor: 2.0 }
        .run(&input, &session.op_context())
        .unwrap();

    // Another image arrives while the operation runs
    session.load_image(solid(30, 20, 200));
    assert!(!session.accept_from(generation, &output));
    assert_eq!(session.processed(), session.original());
    assert_eq!(session.processed().unwrap().dimensions(), (30, 20));

    let generation = session.generation();
    assert!(session.accept_from(generation, &output));
    assert_eq!(session.processed().unwrap().dimensions(), (24, 24));
}

#[test]
fn test_camera_start_invalidates_running_operations() {
    let mut session = Session::new(temp_outputs("stale-camera"), None);
    session.load_image(solid(12, 12, 40));
    let generation = session.generation();
    let output = session.run(&Operation::Median).unwrap();

    assert!(session.start_camera(ScriptedCamera::frames(1)));
    assert_ne!(session.generation(), generation);
    assert!(!session.accept_from(generation, &output));
    assert!(session.processed().is_none());
}
