// SPDX-License-Identifier: MPL-2.0

//! Video recording
//!
//! Processed live frames are appended to an AVI file at a fixed frame rate.
//! The session only sees the [`FrameSink`] trait, so recording logic can be
//! exercised without GStreamer plugins installed.

pub mod recorder;

pub use recorder::{VideoRecorder, check_available_encoders};

use crate::errors::AppResult;
use crate::media::Frame;
use std::path::{Path, PathBuf};

/// Destination for a stream of processed frames
pub trait FrameSink: Send {
    /// Append one frame
    fn push(&mut self, frame: &Frame) -> AppResult<()>;

    /// Flush and close the container, returning the written file
    fn finish(self: Box<Self>) -> AppResult<PathBuf>;

    /// File being written
    fn path(&self) -> &Path;

    /// Frames appended so far
    fn frame_count(&self) -> u64;
}
