// SPDX-License-Identifier: MPL-2.0

//! Camera frame sources
//!
//! The live loop polls a [`FrameSource`] once per tick. A source never blocks:
//! when no new frame has arrived the tick is simply skipped.

pub mod capture;
pub mod types;

pub use capture::{GstCamera, enumerate_cameras};
pub use types::CameraDevice;

use crate::constants::timing;
use crate::errors::{AppResult, CameraError};
use crate::media::Frame;
use std::time::{Duration, Instant};
use tracing::debug;

/// Anything that can hand out raw color frames on demand
pub trait FrameSource: Send {
    /// Newest frame, or `None` when nothing new is available yet
    fn read_frame(&mut self) -> AppResult<Option<Frame>>;

    /// Name shown in logs and the status line
    fn name(&self) -> &str;
}

/// Poll a source until it produces a frame or the timeout expires
///
/// Used by the one-shot CLI commands, which have no tick loop.
pub fn wait_for_frame(source: &mut dyn FrameSource, timeout: Duration) -> AppResult<Frame> {
    let started = Instant::now();
    loop {
        if let Some(frame) = source.read_frame()? {
            debug!(
                source = source.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "First frame received"
            );
            return Ok(frame);
        }
        if started.elapsed() >= timeout {
            return Err(CameraError::InitializationFailed(format!(
                "{} produced no frame within {}s",
                source.name(),
                timeout.as_secs()
            ))
            .into());
        }
        std::thread::sleep(timing::CAMERA_TICK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    struct Delayed {
        remaining: u32,
    }

    impl FrameSource for Delayed {
        fn read_frame(&mut self) -> AppResult<Option<Frame>> {
            if self.remaining == 0 {
                return Ok(Some(Frame::color(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])))?));
            }
            self.remaining -= 1;
            Ok(None)
        }

        fn name(&self) -> &str {
            "delayed"
        }
    }

    #[test]
    fn test_wait_for_frame_skips_empty_polls() {
        let mut source = Delayed { remaining: 3 };
        let frame = wait_for_frame(&mut source, Duration::from_secs(2)).unwrap();
        assert_eq!(frame.dimensions(), (2, 2));
    }

    #[test]
    fn test_wait_for_frame_times_out() {
        let mut source = Delayed {
            remaining: u32::MAX,
        };
        let err = wait_for_frame(&mut source, Duration::from_millis(40)).unwrap_err();
        assert!(err.to_string().contains("delayed"));
    }
}
