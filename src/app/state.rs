// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::backends::{CameraDevice, FrameSource};
use crate::config::Config;
use crate::errors::{AppError, AppResult, OperationError};
use crate::media::Frame;
use crate::ops::{Operation, OperationKind, OperationOutput, PromptField};
use crate::session::Session;
use crate::tools::MarkerLabel;
use cosmic::cosmic_config;
use cosmic::iced::Point;
use cosmic::widget::about::About;
use cosmic::widget::image::Handle;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Context drawer pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextPage {
    #[default]
    About,
    Settings,
}

/// Dismissible notice above the panes
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: String,
    pub is_error: bool,
}

impl Banner {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Numeric input dialog for operations with a `Prompt` requirement
#[derive(Debug, Clone, PartialEq)]
pub struct PromptState {
    pub kind: OperationKind,
    pub fields: &'static [PromptField],
    pub inputs: Vec<String>,
    pub error: Option<String>,
}

impl PromptState {
    /// Dialog pre-filled with the field defaults
    pub fn new(kind: OperationKind, fields: &'static [PromptField]) -> Self {
        Self {
            kind,
            fields,
            inputs: fields.iter().map(|f| format!("{}", f.default)).collect(),
            error: None,
        }
    }

    /// Parse every input; the first problem becomes the dialog message
    pub fn values(&self) -> Result<Vec<f64>, String> {
        self.fields
            .iter()
            .zip(&self.inputs)
            .map(|(field, text)| field.parse(text))
            .collect()
    }

    /// Turn the inputs into an operation
    ///
    /// Out-of-range or malformed input keeps the dialog open with `error` set.
    pub fn submit(&mut self) -> PromptOutcome {
        let values = match self.values() {
            Ok(values) => values,
            Err(message) => {
                self.error = Some(message);
                return PromptOutcome::Invalid;
            }
        };
        match Operation::from_values(self.kind, &values) {
            Ok(operation) => PromptOutcome::Run(operation),
            Err(AppError::Operation(OperationError::InvalidParameter(message))) => {
                self.error = Some(message);
                PromptOutcome::Invalid
            }
            Err(err) => PromptOutcome::Failed(err),
        }
    }

    /// Close the dialog without running anything
    pub fn cancel(self) -> AppError {
        AppError::Cancelled
    }
}

/// What submitting a prompt dialog leads to
#[derive(Debug)]
pub enum PromptOutcome {
    Run(Operation),
    /// The dialog stays open showing the validation message
    Invalid,
    Failed(AppError),
}

/// Multi-panel result shown instead of the panes
#[derive(Debug, Clone)]
pub struct ResultsView {
    pub title: String,
    pub panels: Vec<(String, Handle)>,
    pub note: Option<String>,
}

/// Cached display handles; rebuilt only when the underlying frame changes
#[derive(Debug, Clone, Default)]
pub struct PaneHandles {
    pub original: Option<Handle>,
    pub processed: Option<Handle>,
    /// Tool canvas and its displayed size
    pub tool: Option<(Handle, (u32, u32))>,
}

/// A camera opened on a worker thread, handed over exactly once
#[derive(Clone)]
pub struct OpenedCamera(Arc<Mutex<Option<Box<dyn FrameSource>>>>);

impl OpenedCamera {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self(Arc::new(Mutex::new(Some(source))))
    }

    pub fn take(&self) -> Option<Box<dyn FrameSource>> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl std::fmt::Debug for OpenedCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OpenedCamera")
    }
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Display a context drawer with the designated page if defined.
    pub context_page: ContextPage,
    /// The about page for this app.
    pub about: About,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<cosmic_config::Config>,
    /// Images, camera, recording and tool state
    pub session: Session,
    /// Cameras found at startup; the dropdown adds "Automatic" in front
    pub available_cameras: Vec<CameraDevice>,
    pub camera_dropdown_options: Vec<String>,
    pub theme_dropdown_options: Vec<String>,
    pub codec_dropdown_options: Vec<String>,
    /// Camera is being opened on a worker
    pub camera_opening: bool,
    /// Operation running on a worker
    pub busy: Option<OperationKind>,
    pub prompt: Option<PromptState>,
    pub results: Option<ResultsView>,
    pub banner: Option<Banner>,
    /// Last pointer position over the tool canvas (display coordinates)
    pub pointer: Option<Point>,
    pub handles: PaneHandles,
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== UI Navigation =====
    /// Open external URL (repository, etc.)
    LaunchUrl(String),
    /// Toggle context drawer page (About, Settings)
    ToggleContextPage(ContextPage),
    DismissBanner,

    // ===== Still images =====
    LoadImage,
    ImagePicked(Option<PathBuf>),
    ImageLoaded(AppResult<Frame>),
    ResetImage,
    SaveResult,
    ResultSaved(AppResult<PathBuf>),

    // ===== Operations =====
    RunOperation(OperationKind),
    PromptInput(usize, String),
    PromptSubmit,
    PromptCancel,
    /// Operation, generation of the original it ran on, result
    OperationFinished(OperationKind, u64, AppResult<OperationOutput>),
    CloseResults,

    // ===== Interactive tools =====
    ToolPointerMoved(Point),
    ToolPointerPressed,
    ToolPointerReleased,
    ToolSlider(usize, f64),
    SetMarkerLabel(MarkerLabel),
    ToolClear,
    ToolConfirm,
    ToolCancel,

    // ===== Camera =====
    CamerasEnumerated(Vec<CameraDevice>),
    StartCamera,
    CameraOpened(AppResult<OpenedCamera>),
    StopCamera,
    CameraTick,
    ToggleRecording,
    TakeSnapshot,
    SnapshotSaved(AppResult<PathBuf>),
    SetContrast(i32),
    SetExposure(i32),
    SetSharpen(u32),
    ToggleGrayscale(bool),
    ToggleEdges(bool),
    ToggleFaces(bool),
    ToggleFlip(bool),
    ResetAdjustments,

    // ===== Settings =====
    UpdateConfig(Config),
    SetAppTheme(usize),
    SelectCamera(usize),
    SelectCodec(usize),
    OpenOutputDirectory,
}
