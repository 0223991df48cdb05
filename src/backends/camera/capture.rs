// SPDX-License-Identifier: MPL-2.0

//! GStreamer camera capture
//!
//! ```text
//! v4l2src / autovideosrc ─► videoconvert ─► video/x-raw,format=RGB ─► appsink
//! ```
//!
//! The appsink keeps a single buffer and drops older ones, so each poll sees
//! the newest frame and a slow consumer never builds up latency.

use super::{CameraDevice, FrameSource};
use crate::constants::{pipeline, timing};
use crate::errors::{AppResult, CameraError};
use crate::media::Frame;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use image::RgbImage;
use tracing::{debug, error, info, warn};

/// Live camera backed by a GStreamer pipeline
pub struct GstCamera {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    name: String,
    frames: u64,
}

impl std::fmt::Debug for GstCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GstCamera")
            .field("name", &self.name)
            .field("frames", &self.frames)
            .finish()
    }
}

impl GstCamera {
    /// Open a camera device, or the system default source when `device` is `None`
    pub fn open(device: Option<&str>) -> AppResult<Self> {
        gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let description = pipeline_description(device);
        info!(pipeline = %description, "Opening camera");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::InitializationFailed(format!("Pipeline parse failed: {}", e)))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| CameraError::InitializationFailed("Not a pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CameraError::InitializationFailed("Failed to cast appsink".to_string()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            let detail = bus_error(&pipeline).unwrap_or_else(|| e.to_string());
            let _ = pipeline.set_state(gstreamer::State::Null);
            CameraError::InitializationFailed(detail)
        })?;

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Camera pipeline state");
        if result.is_err() {
            let detail = bus_error(&pipeline)
                .unwrap_or_else(|| "Pipeline failed to reach PLAYING".to_string());
            let _ = pipeline.set_state(gstreamer::State::Null);
            error!(error = %detail, "Camera start failed");
            return Err(CameraError::InitializationFailed(detail).into());
        }
        if state != gstreamer::State::Playing {
            warn!(?state, "Camera pipeline is not yet PLAYING");
        }

        let name = device.unwrap_or("default camera").to_string();
        info!(camera = %name, "Camera opened");
        Ok(Self {
            pipeline,
            appsink,
            name,
            frames: 0,
        })
    }

    /// Open a specific enumerated device
    pub fn open_device(device: &CameraDevice) -> AppResult<Self> {
        let path = (!device.path.is_empty()).then_some(device.path.as_str());
        let mut camera = Self::open(path)?;
        camera.name = device.name.clone();
        Ok(camera)
    }
}

impl FrameSource for GstCamera {
    fn read_frame(&mut self) -> AppResult<Option<Frame>> {
        if let Some(detail) = bus_error(&self.pipeline) {
            error!(camera = %self.name, error = %detail, "Camera pipeline error");
            return Err(CameraError::InitializationFailed(detail).into());
        }

        let Some(sample) = self.appsink.try_pull_sample(gstreamer::ClockTime::ZERO) else {
            if self.appsink.is_eos() {
                warn!(camera = %self.name, "Camera stream ended");
                return Err(CameraError::Disconnected.into());
            }
            return Ok(None);
        };

        let frame = sample_to_frame(&sample)?;
        self.frames += 1;
        if self.frames % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = self.frames,
                width = frame.width(),
                height = frame.height(),
                "Camera frame"
            );
        }
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for GstCamera {
    fn drop(&mut self) {
        debug!(camera = %self.name, "Releasing camera");
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

fn pipeline_description(device: Option<&str>) -> String {
    let source = match device {
        Some(path) if !path.is_empty() => format!("v4l2src device={}", path),
        _ => "autovideosrc".to_string(),
    };
    format!(
        "{} ! videoconvert n-threads={} ! video/x-raw,format={} ! appsink name=sink",
        source,
        pipeline::videoconvert_threads(),
        pipeline::OUTPUT_FORMAT
    )
}

/// Copy an RGB sample into a tightly packed image, honouring the row stride
fn sample_to_frame(sample: &gstreamer::Sample) -> AppResult<Frame> {
    let buffer = sample
        .buffer()
        .ok_or_else(|| CameraError::InvalidFrame("No buffer in sample".to_string()))?;
    let caps = sample
        .caps()
        .ok_or_else(|| CameraError::InvalidFrame("No caps in sample".to_string()))?;
    let info = VideoInfo::from_caps(caps)
        .map_err(|e| CameraError::InvalidFrame(format!("Bad caps: {}", e)))?;
    let map = buffer
        .map_readable()
        .map_err(|e| CameraError::InvalidFrame(format!("Failed to map buffer: {}", e)))?;

    let width = info.width();
    let height = info.height();
    let stride = info.stride()[0] as usize;
    let row = width as usize * 3;
    let data = map.as_slice();
    if stride < row || data.len() < stride * (height as usize - 1) + row {
        return Err(CameraError::InvalidFrame(format!(
            "Buffer of {} bytes too small for {}x{} stride {}",
            data.len(),
            width,
            height,
            stride
        ))
        .into());
    }

    let mut pixels = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        pixels.extend_from_slice(&data[start..start + row]);
    }
    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| CameraError::InvalidFrame("Pixel count mismatch".to_string()))?;
    Frame::color(image)
}

/// Pop a pending error message from the pipeline bus
fn bus_error(pipeline: &gstreamer::Pipeline) -> Option<String> {
    let bus = pipeline.bus()?;
    let msg = bus.pop_filtered(&[gstreamer::MessageType::Error])?;
    match msg.view() {
        gstreamer::MessageView::Error(err) => {
            debug!(
                error = %err.error(),
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "Bus error"
            );
            Some(err.error().to_string())
        }
        _ => None,
    }
}

/// List video capture devices known to GStreamer
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    if let Err(e) = gstreamer::init() {
        warn!(error = %e, "GStreamer init failed, no cameras listed");
        return Vec::new();
    }

    let monitor = gstreamer::DeviceMonitor::new();
    let _ = monitor.add_filter(Some("Video/Source"), None);
    if let Err(e) = monitor.start() {
        warn!(error = %e, "Device monitor failed to start");
        return Vec::new();
    }

    let cameras: Vec<CameraDevice> = monitor
        .devices()
        .into_iter()
        .map(|device| {
            let path = device
                .properties()
                .and_then(|props| {
                    props
                        .get::<String>("device.path")
                        .or_else(|_| props.get::<String>("api.v4l2.path"))
                        .ok()
                })
                .unwrap_or_default();
            CameraDevice {
                name: device.display_name().to_string(),
                path,
            }
        })
        .collect();
    monitor.stop();

    info!(count = cameras.len(), "Enumerated cameras");
    cameras
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_uses_device_when_given() {
        let description = pipeline_description(Some("/dev/video2"));
        assert!(description.starts_with("v4l2src device=/dev/video2 !"));
        assert!(description.contains("format=RGB"));
        assert!(description.ends_with("appsink name=sink"));
    }

    #[test]
    fn test_pipeline_falls_back_to_autovideosrc() {
        assert!(pipeline_description(None).starts_with("autovideosrc !"));
        assert!(pipeline_description(Some("")).starts_with("autovideosrc !"));
    }
}
