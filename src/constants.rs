// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Codec used for camera recordings
///
/// Recordings are always written to an AVI container. MPEG-4 Part 2 is the
/// XVID-compatible default; Motion-JPEG is the fallback when no MPEG-4 encoder
/// element is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordingCodec {
    /// MPEG-4 Part 2 (XVID compatible)
    #[default]
    Mpeg4,
    /// Motion-JPEG
    Mjpeg,
}

impl RecordingCodec {
    /// All codecs in preference order
    pub const ALL: [RecordingCodec; 2] = [RecordingCodec::Mpeg4, RecordingCodec::Mjpeg];

    /// Get display name for the codec
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordingCodec::Mpeg4 => "MPEG-4 (XVID)",
            RecordingCodec::Mjpeg => "Motion JPEG",
        }
    }

    /// GStreamer encoder element for this codec
    pub fn encoder_element(&self) -> &'static str {
        match self {
            RecordingCodec::Mpeg4 => "avenc_mpeg4",
            RecordingCodec::Mjpeg => "jpegenc",
        }
    }

    /// Codecs to try, starting with this one
    pub fn fallback_chain(&self) -> Vec<RecordingCodec> {
        let mut chain = vec![*self];
        chain.extend(Self::ALL.iter().copied().filter(|c| c != self));
        chain
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Interval of the live camera tick
    pub const CAMERA_TICK_MS: u64 = 15;

    /// Interval of the live camera tick as a Duration
    pub const CAMERA_TICK: Duration = Duration::from_millis(CAMERA_TICK_MS);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Maximum wait for EOS when finalising a recording
    pub const EOS_TIMEOUT_SECS: u64 = 5;

    /// Time the CLI waits for the camera to settle before grabbing a frame
    pub const WARMUP_MS: u64 = 500;

    /// Give up waiting for the first CLI frame after this long
    pub const FIRST_FRAME_TIMEOUT_SECS: u64 = 5;
}

/// Recording parameters
pub mod recording {
    /// Fixed frame rate of recordings
    pub const FPS: i32 = 20;

    /// Container element
    pub const MUXER: &str = "avimux";

    /// Container file extension
    pub const EXTENSION: &str = "avi";
}

/// Maximum edge lengths of the display surfaces
pub mod preview {
    /// Original and processed still panes
    pub const STILL_MAX: u32 = 600;

    /// Processed pane while the camera is live
    pub const LIVE_MAX: u32 = 800;

    /// Interactive preview tools
    pub const TOOL_MAX: u32 = 500;

    /// Panels in the multi-result view
    pub const PANEL_MAX: u32 = 360;
}

/// Live adjustment ranges and fixed parameters
pub mod adjust {
    /// Contrast and exposure slider bound (symmetric)
    pub const OFFSET_LIMIT: i32 = 100;

    /// Upper bound of the sharpen slider
    pub const SHARPEN_MAX: u32 = 100;

    /// Gaussian sigma for unsharp masking
    pub const SHARPEN_SIGMA: f32 = 3.0;

    /// Blend weight gain: alpha = 1 + amount / 100 * gain
    pub const SHARPEN_GAIN: f32 = 1.5;

    /// Canny thresholds of the live edge effect
    pub const EDGE_LOW: f32 = 100.0;
    pub const EDGE_HIGH: f32 = 200.0;

    /// Step used by the terminal viewer keys
    pub const KEY_STEP: i32 = 10;
}

/// Haar cascade detection parameters
pub mod cascades {
    /// Default directory (relative to the working directory)
    pub const DEFAULT_DIR: &str = "haarcascades";

    /// Frontal face model file name
    pub const FACE_FILE: &str = "haarcascade_frontalface_default.xml";

    /// Eye model file name
    pub const EYE_FILE: &str = "haarcascade_eye.xml";

    /// Pyramid step for live frames
    pub const LIVE_SCALE_FACTOR: f32 = 1.2;

    /// Pyramid step for still images
    pub const STILL_SCALE_FACTOR: f32 = 1.3;

    /// Pyramid step for eyes inside a face
    pub const EYE_SCALE_FACTOR: f32 = 1.1;

    /// Neighbour count for faces
    pub const MIN_NEIGHBORS: usize = 5;

    /// Neighbour count for eyes
    pub const EYE_MIN_NEIGHBORS: usize = 3;

    /// Rectangle grouping tolerance
    pub const GROUP_EPS: f32 = 0.2;

    /// Face outline thickness on live frames
    pub const LIVE_FACE_THICKNESS: u32 = 2;

    /// Face outline thickness on still images
    pub const STILL_FACE_THICKNESS: u32 = 3;

    /// Eye outline thickness
    pub const EYE_THICKNESS: u32 = 2;
}

/// Operation parameters
pub mod ops {
    pub const MEDIAN_KSIZE: u32 = 5;
    pub const AVERAGE_KSIZE: u32 = 5;
    pub const SOBEL_KSIZE: u32 = 5;

    pub const BLUR_KSIZE_MIN: u32 = 1;
    pub const BLUR_KSIZE_MAX: u32 = 51;
    pub const BLUR_KSIZE_DEFAULT: u32 = 5;

    pub const CANNY_DEFAULT_LOW: u8 = 100;
    pub const CANNY_DEFAULT_HIGH: u8 = 200;

    /// Sharpen preview slider; the blend weight is amount / 10
    pub const SHARPEN_AMOUNT_MAX: u32 = 50;
    pub const SHARPEN_AMOUNT_DEFAULT: u32 = 10;

    pub const CIRCLE_MEDIAN_KSIZE: u32 = 5;
    pub const CIRCLE_MIN_DIST: f32 = 20.0;
    pub const CIRCLE_CANNY_HIGH: f32 = 50.0;
    pub const CIRCLE_ACCUMULATOR: u32 = 30;
    pub const CIRCLE_MIN_RADIUS: u32 = 10;
    pub const CIRCLE_MAX_RADIUS: u32 = 100;

    pub const LINES_CANNY_LOW: f32 = 50.0;
    pub const LINES_CANNY_HIGH: f32 = 150.0;
    pub const LINES_THRESHOLD: u32 = 80;
    pub const LINES_MIN_LENGTH: f32 = 50.0;
    pub const LINES_MAX_GAP: u32 = 10;

    pub const HARRIS_BLOCK: u32 = 2;
    pub const HARRIS_KSIZE: u32 = 3;
    pub const HARRIS_K: f32 = 0.04;
    pub const HARRIS_RATIO: f32 = 0.01;

    /// HSV bounds of the green ball mask (hue in 0..180)
    pub const BALL_LOWER: [u8; 3] = [35, 100, 100];
    pub const BALL_UPPER: [u8; 3] = [85, 255, 255];

    pub const KMEANS_MIN: u32 = 2;
    pub const KMEANS_MAX: u32 = 32;
    pub const KMEANS_DEFAULT: u32 = 4;
    pub const KMEANS_MAX_ITER: usize = 100;
    pub const KMEANS_EPS: f32 = 0.2;
    pub const KMEANS_ATTEMPTS: usize = 10;

    pub const WATERSHED_FG_RATIO: f32 = 0.7;
    pub const BRUSH_RADIUS: i32 = 5;

    pub const BINARY_THRESHOLD: u8 = 127;
    pub const MORPH_BASIC_KSIZE: u8 = 5;
    pub const MORPH_OPEN_KSIZE: u8 = 9;

    pub const ROTATION_LIMIT: f64 = 360.0;
    pub const ZOOM_MIN: f64 = 0.1;
    /// Upper bound so a typo cannot allocate a gigapixel buffer
    pub const ZOOM_MAX: f64 = 10.0;
    pub const TRANSLATION_LIMIT: f64 = 10_000.0;

    /// Iterations of the rectangle-seeded object mask
    pub const MASK_ITERATIONS: usize = 5;
}

/// File naming
pub mod files {
    /// Timestamp format for generated file names (second resolution)
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    pub const SNAPSHOT_PREFIX: &str = "snapshot";
    pub const RECORDING_PREFIX: &str = "recording";
    pub const PROCESSED_PREFIX: &str = "processed";

    /// Supported still image extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Camera capture pipeline
pub mod pipeline {
    /// Keep only the newest frame
    pub const MAX_BUFFERS: u32 = 1;

    /// Pixel format delivered to the app
    pub const OUTPUT_FORMAT: &str = "RGB";

    /// Get number of threads for videoconvert based on available CPU threads
    pub fn videoconvert_threads() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(4)
    }
}

/// UI layout
pub mod ui {
    /// Width of the control column
    pub const SIDEBAR_WIDTH: f32 = 320.0;

    /// Width of buttons in the operation lists
    pub const OPERATION_BUTTON_WIDTH: f32 = 280.0;
}

pub mod app_info {
    /// Reverse-DNS application id, also the config namespace
    pub const APP_ID: &str = "io.github.vislab-app.vislab";

    pub const REPOSITORY: &str = "https://github.com/vislab-app/vislab";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_chain_starts_with_choice() {
        assert_eq!(
            RecordingCodec::Mjpeg.fallback_chain(),
            vec![RecordingCodec::Mjpeg, RecordingCodec::Mpeg4]
        );
        assert_eq!(RecordingCodec::Mpeg4.fallback_chain().len(), 2);
    }

    #[test]
    fn test_image_extensions() {
        assert!(files::is_image_extension("PNG"));
        assert!(files::is_image_extension("jpeg"));
        assert!(!files::is_image_extension("avi"));
    }
}
