// SPDX-License-Identifier: MPL-2.0

//! Still image persistence
//!
//! Snapshots of the live pipeline and exports of processed stills are written
//! as PNG files named `<prefix>_<YYYYMMDD_HHMMSS>.png`. Gray frames stay
//! single-channel.

use crate::errors::{AppResult, PhotoError};
use crate::media::Frame;
use crate::storage::OutputDirs;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encode a frame as PNG bytes
pub fn encode_png(frame: &Frame) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    frame
        .to_dynamic()
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;
    debug!(size = buffer.len(), "PNG encoded");
    Ok(buffer)
}

/// Write a frame to an explicit path
pub fn write_frame(frame: &Frame, path: &Path) -> AppResult<()> {
    let data = encode_png(frame)?;
    std::fs::write(path, &data)
        .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", path.display(), e)))?;
    info!(
        path = %path.display(),
        width = frame.width(),
        height = frame.height(),
        "Image saved"
    );
    Ok(())
}

/// Write a frame under a fresh timestamped name in the output directory
pub fn save_frame(frame: &Frame, outputs: &OutputDirs, prefix: &str) -> AppResult<PathBuf> {
    let path = outputs.next_path(prefix, "png")?;
    write_frame(frame, &path)?;
    Ok(path)
}

/// [`save_frame`] on a blocking worker, for use from async tasks
pub async fn save_frame_async(
    frame: Frame,
    outputs: OutputDirs,
    prefix: &'static str,
) -> AppResult<PathBuf> {
    tokio::task::spawn_blocking(move || save_frame(&frame, &outputs, prefix))
        .await
        .map_err(|e| PhotoError::SaveFailed(format!("Save task error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_gray_frames_stay_single_channel() {
        let dir = std::env::temp_dir().join(format!("vislab-photo-{}", std::process::id()));
        let outputs = OutputDirs::new(&dir);
        let frame = Frame::gray(GrayImage::from_pixel(5, 4, Luma([200]))).unwrap();

        let path = save_frame(&frame, &outputs, "snapshot").unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("snapshot_"));

        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.color(), image::ColorType::L8);
        assert_eq!(loaded.to_luma8(), frame.to_gray());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
