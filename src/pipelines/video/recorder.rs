// SPDX-License-Identifier: MPL-2.0

//! GStreamer recorder fed from the live pipeline
//!
//! ```text
//! appsrc (RGB) ─► videoconvert ─► encoder ─► avimux ─► filesink
//! ```
//!
//! Frames are pushed with explicit timestamps derived from a frame counter,
//! so the file plays at the configured rate regardless of tick jitter.

use super::FrameSink;
use crate::constants::{RecordingCodec, recording, timing};
use crate::errors::{AppResult, RecordingError};
use crate::media::Frame;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use image::RgbImage;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Video recorder writing one AVI file
#[derive(Debug)]
pub struct VideoRecorder {
    pipeline: gst::Pipeline,
    appsrc: AppSrc,
    path: PathBuf,
    width: u32,
    height: u32,
    fps: i32,
    codec: RecordingCodec,
    frames: u64,
}

impl VideoRecorder {
    /// Build and start the recording pipeline
    ///
    /// The recording size is rounded down to even dimensions, which MPEG-4
    /// requires. Frames of any other size are resized on push.
    pub fn start(
        path: &Path,
        width: u32,
        height: u32,
        fps: i32,
        codec: RecordingCodec,
    ) -> AppResult<Self> {
        gst::init()
            .map_err(|e| RecordingError::StartFailed(format!("GStreamer init failed: {}", e)))?;

        let width = (width & !1).max(2);
        let height = (height & !1).max(2);
        let fps = fps.max(1);

        info!(
            path = %path.display(),
            width,
            height,
            fps,
            codec = codec.display_name(),
            "Creating video recorder"
        );

        let (encoder, used_codec) = make_encoder(codec)?;

        let pipeline = gst::Pipeline::new();

        let appsrc = gst::ElementFactory::make("appsrc")
            .name("recorder_src")
            .build()
            .map_err(|e| RecordingError::StartFailed(format!("Failed to create appsrc: {}", e)))?
            .downcast::<AppSrc>()
            .map_err(|_| RecordingError::StartFailed("Failed to cast to AppSrc".into()))?;

        let caps = gst::Caps::builder("video/x-raw")
            .field("format", "RGB")
            .field("width", width as i32)
            .field("height", height as i32)
            .field("framerate", gst::Fraction::new(fps, 1))
            .build();
        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gst::Format::Time);
        appsrc.set_is_live(true);
        appsrc.set_do_timestamp(false);

        let convert = gst::ElementFactory::make("videoconvert")
            .name("recorder_convert")
            .build()
            .map_err(|e| {
                RecordingError::StartFailed(format!("Failed to create videoconvert: {}", e))
            })?;

        let muxer = gst::ElementFactory::make(recording::MUXER)
            .name("recorder_mux")
            .build()
            .map_err(|e| RecordingError::StartFailed(format!("Failed to create muxer: {}", e)))?;

        let filesink = gst::ElementFactory::make("filesink")
            .name("recorder_sink")
            .property("location", path.to_string_lossy().to_string())
            .build()
            .map_err(|e| {
                RecordingError::StartFailed(format!("Failed to create filesink: {}", e))
            })?;

        pipeline
            .add_many([appsrc.upcast_ref(), &convert, &encoder, &muxer, &filesink])
            .map_err(|e| RecordingError::StartFailed(format!("Failed to add elements: {}", e)))?;

        gst::Element::link_many([appsrc.upcast_ref(), &convert, &encoder, &muxer, &filesink])
            .map_err(|e| {
                RecordingError::StartFailed(format!("Failed to link recorder elements: {}", e))
            })?;

        pipeline.set_state(gst::State::Playing).map_err(|e| {
            RecordingError::StartFailed(format!("Failed to start recording pipeline: {}", e))
        })?;

        let recorder = Self {
            pipeline,
            appsrc,
            path: path.to_path_buf(),
            width,
            height,
            fps,
            codec: used_codec,
            frames: 0,
        };
        recorder.check_bus()?;

        info!(codec = used_codec.display_name(), "Recording started");
        Ok(recorder)
    }

    /// Codec actually in use after fallback
    pub fn codec(&self) -> RecordingCodec {
        self.codec
    }

    /// Recording dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Surface an error already posted on the bus, without waiting
    fn check_bus(&self) -> AppResult<()> {
        let Some(bus) = self.pipeline.bus() else {
            return Ok(());
        };
        if let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error])
            && let gst::MessageView::Error(err) = msg.view()
        {
            error!(
                error = %err.error(),
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer error during recording"
            );
            return Err(RecordingError::PipelineError(err.error().to_string()).into());
        }
        Ok(())
    }

    /// Frame as an RGB image of the recording size
    fn conform(&self, frame: &Frame) -> RgbImage {
        let rgb = frame.to_rgb();
        if rgb.dimensions() == (self.width, self.height) {
            rgb
        } else {
            image::imageops::resize(&rgb, self.width, self.height, FilterType::Triangle)
        }
    }

    fn frame_duration(&self) -> u64 {
        gst::ClockTime::SECOND.nseconds() / self.fps as u64
    }
}

impl FrameSink for VideoRecorder {
    fn push(&mut self, frame: &Frame) -> AppResult<()> {
        let rgb = self.conform(frame);

        // GStreamer RGB rows are padded to 4 bytes
        let row = self.width as usize * 3;
        let stride = (row + 3) & !3;
        let size = stride * self.height as usize;

        let mut buffer = gst::Buffer::with_size(size)
            .map_err(|e| RecordingError::PipelineError(format!("Buffer allocation failed: {}", e)))?;
        {
            let duration = self.frame_duration();
            let buffer_ref = buffer.get_mut().ok_or_else(|| {
                RecordingError::PipelineError("Failed to get mutable buffer".into())
            })?;
            buffer_ref.set_pts(gst::ClockTime::from_nseconds(self.frames * duration));
            buffer_ref.set_duration(gst::ClockTime::from_nseconds(duration));

            let mut map = buffer_ref
                .map_writable()
                .map_err(|e| RecordingError::PipelineError(format!("Buffer map failed: {}", e)))?;
            let data = map.as_mut_slice();
            for (y, src) in rgb.as_raw().chunks_exact(row).enumerate() {
                let start = y * stride;
                data[start..start + row].copy_from_slice(src);
            }
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| RecordingError::PipelineError(format!("Push failed: {:?}", e)))?;
        self.frames += 1;

        if self.frames % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(frames = self.frames, "Recording progress");
            self.check_bus()?;
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> AppResult<PathBuf> {
        info!(frames = self.frames, "Stopping video recording");

        if let Err(e) = self.appsrc.end_of_stream() {
            warn!(error = ?e, "Failed to send EOS to appsrc");
        }

        let mut result = Ok(());
        if let Some(bus) = self.pipeline.bus() {
            match bus.timed_pop_filtered(
                gst::ClockTime::from_seconds(timing::EOS_TIMEOUT_SECS),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            ) {
                Some(msg) => {
                    if let gst::MessageView::Error(err) = msg.view() {
                        error!(
                            error = %err.error(),
                            debug = ?err.debug(),
                            "GStreamer error while finalizing recording"
                        );
                        result = Err(RecordingError::StopFailed(err.error().to_string()));
                    }
                }
                None => warn!("Timed out waiting for EOS, file may be truncated"),
            }
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| RecordingError::StopFailed(format!("Failed to stop pipeline: {}", e)))?;
        result?;

        info!(path = %self.path.display(), "Recording saved");
        Ok(self.path.clone())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

/// First encoder of the codec's fallback chain that can be instantiated
fn make_encoder(codec: RecordingCodec) -> AppResult<(gst::Element, RecordingCodec)> {
    for candidate in codec.fallback_chain() {
        let name = candidate.encoder_element();
        match gst::ElementFactory::make(name).name("recorder_enc").build() {
            Ok(encoder) => {
                if candidate != codec {
                    warn!(
                        requested = codec.display_name(),
                        using = candidate.display_name(),
                        "Preferred encoder unavailable, falling back"
                    );
                }
                configure_encoder(&encoder, candidate);
                return Ok((encoder, candidate));
            }
            Err(_) => debug!(encoder = name, "Encoder not available"),
        }
    }
    Err(RecordingError::EncoderNotAvailable(format!(
        "none of {:?} are installed",
        codec
            .fallback_chain()
            .iter()
            .map(|c| c.encoder_element())
            .collect::<Vec<_>>()
    ))
    .into())
}

fn configure_encoder(encoder: &gst::Element, codec: RecordingCodec) {
    // Property types differ between plugin versions; the string setters coerce
    match codec {
        RecordingCodec::Mpeg4 => {
            if encoder.has_property("bitrate") {
                let _ = encoder.set_property_from_str("bitrate", "4000000");
            }
        }
        RecordingCodec::Mjpeg => {
            if encoder.has_property("quality") {
                let _ = encoder.set_property_from_str("quality", "90");
            }
        }
    }
}

/// Log which recording encoders are installed
pub fn check_available_encoders() -> Vec<(RecordingCodec, bool)> {
    if let Err(e) = gst::init() {
        warn!(error = %e, "GStreamer init failed");
        return RecordingCodec::ALL.iter().map(|c| (*c, false)).collect();
    }
    RecordingCodec::ALL
        .iter()
        .map(|codec| {
            let available = gst::ElementFactory::find(codec.encoder_element()).is_some();
            info!(
                codec = codec.display_name(),
                element = codec.encoder_element(),
                available,
                "Encoder availability"
            );
            (*codec, available)
        })
        .collect()
}
