// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing operations and cameras
//! - Running an operation on an image file
//! - Taking a snapshot and recording a clip from a camera
//! - Checking the Haar cascade files

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use vislab::backends::camera::wait_for_frame;
use vislab::backends::{FrameSource, GstCamera, enumerate_cameras, load_image};
use vislab::config::Config;
use vislab::constants::{files, recording, timing};
use vislab::detect::{CascadeStatus, FaceDetector};
use vislab::errors::{AppError, OperationError};
use vislab::ops::{OpContext, Operation, OperationCategory, OperationKind, OperationOutput};
use vislab::pipelines::photo;
use vislab::pipelines::video::{FrameSink, VideoRecorder};
use vislab::storage::OutputDirs;

/// List operations by category, then the cameras GStreamer can see
pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    println!("Operations:");
    for category in OperationCategory::ALL {
        println!();
        println!("  {}", category.label());
        for kind in category.kinds() {
            let params: Vec<String> = kind
                .fields()
                .iter()
                .map(|f| format!("{}={}..{}", f.key, f.min, f.max))
                .collect();
            if kind == OperationKind::WatershedMarkers {
                println!("    {:<18} {} (GUI only)", kind.id(), kind.label());
            } else if params.is_empty() {
                println!("    {:<18} {}", kind.id(), kind.label());
            } else {
                println!(
                    "    {:<18} {} [{}]",
                    kind.id(),
                    kind.label(),
                    params.join(", ")
                );
            }
        }
    }
    println!();

    gstreamer::init()?;
    let cameras = enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Device: {}", camera.path);
    }
    Ok(())
}

/// Parse `key=value` pairs against the fields of `kind`, filling in defaults
fn parse_params(kind: OperationKind, params: &[String]) -> Result<Vec<f64>, String> {
    let fields = kind.fields();
    let mut values: Vec<Option<f64>> = fields.iter().map(|_| None).collect();

    for param in params {
        let (key, text) = param
            .split_once('=')
            .ok_or_else(|| format!("Parameter '{}' is not key=value", param))?;
        let index = fields
            .iter()
            .position(|f| f.key == key.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = fields.iter().map(|f| f.key).collect();
                format!(
                    "{} has no parameter '{}' (accepted: {})",
                    kind.id(),
                    key,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                )
            })?;
        values[index] = Some(fields[index].parse(text)?);
    }

    Ok(values
        .into_iter()
        .zip(fields)
        .map(|(value, field)| value.unwrap_or(field.default))
        .collect())
}

/// File name for one panel of a multi-panel result
fn panel_path(output: &Path, index: usize, title: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "result".to_string());
    let slug: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    output.with_file_name(format!("{}_{}_{}.png", stem, index, slug))
}

/// Run one operation on an image file
pub fn apply(
    operation: &str,
    input: PathBuf,
    output: PathBuf,
    params: Vec<String>,
    cascades: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = OperationKind::from_id(operation)
        .ok_or_else(|| AppError::from(OperationError::UnknownOperation(operation.to_string())))?;
    if kind == OperationKind::WatershedMarkers {
        return Err(format!("{} needs painted markers; use the GUI", kind.id()).into());
    }

    let values = parse_params(kind, &params)?;
    let op = Operation::from_values(kind, &values)?;

    let ctx = if kind == OperationKind::FacesEyes {
        let (_, config) = Config::load();
        let dir = cascades.unwrap_or_else(|| config.cascade_path());
        OpContext {
            detector: FaceDetector::load(&dir).map(Arc::new),
        }
    } else {
        OpContext::default()
    };

    let frame = load_image(&input)?;
    println!(
        "Input: {} ({}x{})",
        input.display(),
        frame.width(),
        frame.height()
    );

    let start = Instant::now();
    let result = op.run(&frame, &ctx)?;
    println!("{} took {:.2}s", kind.label(), start.elapsed().as_secs_f64());

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    match result {
        OperationOutput::Single(frame) => {
            frame.save(&output)?;
            println!("Saved: {}", output.display());
        }
        OperationOutput::Panels { panels, note } => {
            if let Some(note) = note {
                println!("{}", note);
            }
            for (index, panel) in panels.iter().enumerate() {
                let path = panel_path(&output, index + 1, &panel.title);
                photo::write_frame(&panel.frame, &path)?;
                println!("Saved {}: {}", panel.title, path.display());
            }
        }
    }
    Ok(())
}

/// Open the requested camera and wait until frames flow
fn open_camera(device: Option<String>) -> Result<GstCamera, Box<dyn std::error::Error>> {
    gstreamer::init()?;
    let (_, config) = Config::load();
    let device = device.or(config.camera_device);
    let mut camera = GstCamera::open(device.as_deref())?;
    println!("Using camera: {}", camera.name());

    // Camera warm-up: skip the first, often dark, frames
    wait_for_frame(
        &mut camera,
        Duration::from_secs(timing::FIRST_FRAME_TIMEOUT_SECS),
    )?;
    std::thread::sleep(Duration::from_millis(timing::WARMUP_MS));
    Ok(camera)
}

/// Resolve an explicit output (file or directory) or fall back to the configured directory
fn output_target(
    output: Option<PathBuf>,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match output {
        Some(path) if path.is_dir() => Ok(OutputDirs::new(path).next_path(prefix, extension)?),
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            Ok(path)
        }
        None => {
            let (_, config) = Config::load();
            Ok(OutputDirs::resolve(&config).next_path(prefix, extension)?)
        }
    }
}

/// Save one camera frame as a PNG
pub fn snapshot(
    camera: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = open_camera(camera)?;
    let frame = wait_for_frame(
        &mut camera,
        Duration::from_secs(timing::FIRST_FRAME_TIMEOUT_SECS),
    )?;
    let path = output_target(output, files::SNAPSHOT_PREFIX, "png")?;
    photo::write_frame(&frame, &path)?;
    println!("Snapshot saved: {}", path.display());
    Ok(())
}

/// Record a clip of `duration` seconds; Ctrl+C stops early
pub fn record(
    camera: Option<String>,
    duration: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = open_camera(camera)?;
    let first = wait_for_frame(
        &mut camera,
        Duration::from_secs(timing::FIRST_FRAME_TIMEOUT_SECS),
    )?;
    let path = output_target(output, files::RECORDING_PREFIX, recording::EXTENSION)?;
    let (_, config) = Config::load();

    let mut recorder = VideoRecorder::start(
        &path,
        first.width(),
        first.height(),
        recording::FPS,
        config.recording_codec,
    )?;
    println!(
        "Recording {}x{} @ {}fps with {}",
        recorder.dimensions().0,
        recorder.dimensions().1,
        recording::FPS,
        recorder.codec().display_name()
    );
    println!("Output: {}", path.display());
    println!("Duration: {} seconds", duration);
    println!();
    println!("Recording... (press Ctrl+C to stop early)");
    recorder.push(&first)?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    let mut last_print = 0;

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }
        if let Some(frame) = camera.read_frame()? {
            recorder.push(&frame)?;
        }

        let elapsed = start.elapsed().as_secs();
        if elapsed != last_print {
            last_print = elapsed;
            print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
            std::io::Write::flush(&mut std::io::stdout())?;
        }
        std::thread::sleep(timing::CAMERA_TICK);
    }
    println!();

    let frames = recorder.frame_count();
    let final_path = Box::new(recorder).finish()?;
    println!("Video saved: {} ({} frames)", final_path.display(), frames);
    Ok(())
}

/// Report whether the Haar cascade files can be used
pub fn check_cascades(dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dir.unwrap_or_else(|| Config::load().1.cascade_path());
    println!("Cascade directory: {}", dir.display());

    let mut usable = true;
    for (path, status) in FaceDetector::check(&dir) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match status {
            CascadeStatus::Loaded { stages, window } => {
                println!(
                    "  {:<40} ok ({} stages, {}x{} window)",
                    name, stages, window.0, window.1
                );
            }
            CascadeStatus::Missing => {
                usable = false;
                println!("  {:<40} missing", name);
            }
            CascadeStatus::Invalid(e) => {
                usable = false;
                println!("  {:<40} invalid: {}", name, e);
            }
        }
    }

    if usable {
        println!("Face and eye detection available.");
        Ok(())
    } else {
        Err("Face and eye detection disabled".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_fill_defaults() {
        let values = parse_params(OperationKind::Translation, &["dy=-20".to_string()]).unwrap();
        assert_eq!(values, vec![50.0, -20.0]);
    }

    #[test]
    fn test_params_reject_unknown_and_out_of_range() {
        assert!(parse_params(OperationKind::KMeans, &["clusters=3".to_string()]).is_err());
        assert!(parse_params(OperationKind::KMeans, &["k=64".to_string()]).is_err());
        assert!(parse_params(OperationKind::Median, &["k=3".to_string()]).is_err());
        assert!(parse_params(OperationKind::Zoom, &["factor".to_string()]).is_err());
    }

    #[test]
    fn test_panel_paths() {
        let path = panel_path(Path::new("/tmp/out/result.png"), 2, "Sobel Y");
        assert_eq!(path, PathBuf::from("/tmp/out/result_2_sobel-y.png"));
    }
}
