// SPDX-License-Identifier: MPL-2.0

//! Error types for the image processing workbench
//!
//! Every failure is local to the action that raised it: callers surface the
//! message and leave session state untouched.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// A required input or mode is missing (no image, camera off, no frame yet)
    Precondition(PreconditionError),
    /// Camera-related errors
    Camera(CameraError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Snapshot and image export errors
    Photo(PhotoError),
    /// Image operation errors
    Operation(OperationError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// The user dismissed a prompt or tool
    Cancelled,
}

/// Missing preconditions for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    /// No still image has been loaded
    NoImageLoaded,
    /// The action needs the live camera
    CameraNotActive,
    /// The camera has not produced a frame yet
    NoFrameAvailable,
    /// Haar cascade models were not found at startup
    CascadesMissing,
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Camera initialization failed
    InitializationFailed(String),
    /// Camera disconnected or the stream ended
    Disconnected,
    /// Frame could not be mapped or had an unexpected layout
    InvalidFrame(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// Failed to start recording
    StartFailed(String),
    /// Failed to stop recording
    StopFailed(String),
    /// No usable encoder element available
    EncoderNotAvailable(String),
    /// Recording already in progress
    AlreadyRecording,
    /// Recording is not running
    NotRecording,
    /// Pipeline error during recording
    PipelineError(String),
}

/// Snapshot and export errors
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoError {
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

/// Errors raised by image operations
#[derive(Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Zero-sized frame or selection
    EmptyFrame,
    /// Parameter outside of its accepted range
    InvalidParameter(String),
    /// Image decoding failed
    Decode(String),
    /// Operation name not recognised
    UnknownOperation(String),
    /// The background worker running the operation went away
    Interrupted(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Precondition(e) => write!(f, "{}", e),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Operation(e) => write!(f, "Operation failed: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionError::NoImageLoaded => write!(f, "Please load an image first"),
            PreconditionError::CameraNotActive => write!(f, "Start the camera first"),
            PreconditionError::NoFrameAvailable => write!(f, "No video frame available yet"),
            PreconditionError::CascadesMissing => {
                write!(f, "Haar cascade files were not loaded")
            }
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::Disconnected => write!(f, "Camera disconnected"),
            CameraError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordingError::StopFailed(msg) => write!(f, "Failed to stop recording: {}", msg),
            RecordingError::EncoderNotAvailable(msg) => write!(f, "Encoder not available: {}", msg),
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::NotRecording => write!(f, "Not recording"),
            RecordingError::PipelineError(msg) => write!(f, "Pipeline error: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::EmptyFrame => write!(f, "Image has no pixels"),
            OperationError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            OperationError::Decode(msg) => write!(f, "Could not read image: {}", msg),
            OperationError::UnknownOperation(name) => write!(f, "Unknown operation: {}", name),
            OperationError::Interrupted(msg) => write!(f, "Interrupted: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PreconditionError {}
impl std::error::Error for CameraError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for OperationError {}

// Conversions from sub-errors to AppError
impl From<PreconditionError> for AppError {
    fn from(err: PreconditionError) -> Self {
        AppError::Precondition(err)
    }
}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<OperationError> for AppError {
    fn from(err: OperationError) -> Self {
        AppError::Operation(err)
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => AppError::Storage(e.to_string()),
            image::ImageError::Decoding(e) => OperationError::Decode(e.to_string()).into(),
            image::ImageError::Unsupported(e) => OperationError::Decode(e.to_string()).into(),
            other => PhotoError::EncodingFailed(other.to_string()).into(),
        }
    }
}

impl AppError {
    /// Whether this error is a user cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}
