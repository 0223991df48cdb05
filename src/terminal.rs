// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based live viewer
//!
//! Runs the full adjustment pipeline on the camera feed and renders it to the
//! terminal using Unicode half-block characters for improved vertical
//! resolution. Snapshots and recordings go to the same place as in the GUI.

use crate::backends::GstCamera;
use crate::config::Config;
use crate::constants::adjust;
use crate::detect::FaceDetector;
use crate::media::Frame;
use crate::pipelines::adjust::AdjustmentSettings;
use crate::pipelines::video::{FrameSink, VideoRecorder};
use crate::session::Session;
use crate::storage::OutputDirs;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use tracing::{error, info};

/// Run the terminal viewer on `device` (or the configured/default camera)
pub fn run(device: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let (_, config) = Config::load();
    let device = device.or_else(|| config.camera_device.clone());
    let detector = FaceDetector::load(&config.cascade_path());
    let mut session = Session::new(OutputDirs::resolve(&config), detector);

    let camera = GstCamera::open(device.as_deref())?;
    session.start_camera(Box::new(camera));

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut session, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if session.is_recording() {
        match session.stop_recording() {
            Ok(path) => info!(path = %path.display(), "Recording saved on exit"),
            Err(e) => error!(error = %e, "Failed to finalize recording on exit"),
        }
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut show_help = false;
    let mut message: Option<String> = None;

    loop {
        match session.tick() {
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Live tick failed");
                message = Some(format!("Error: {}", e));
            }
        }

        let status = if show_help {
            help_message()
        } else if let Some(msg) = &message {
            msg.clone()
        } else {
            status_message(session)
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let frame_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(
                FrameWidget {
                    frame: session.live_frame(),
                    camera_active: session.is_camera_active(),
                },
                frame_area,
            );

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(StatusBar { message: &status }, status_area);
        })?;

        // The poll timeout doubles as the camera tick
        if !event::poll(crate::constants::timing::CAMERA_TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }
        let KeyCode::Char(ch) = key.code else {
            continue;
        };

        let mut settings = *session.settings();
        if adjust_for_key(&mut settings, ch) {
            session.set_settings(settings);
            message = None;
            continue;
        }

        match ch {
            'q' => break,
            'h' => show_help = !show_help,
            'p' => {
                show_help = false;
                message = Some(match session.take_snapshot() {
                    Ok(path) => format!("Saved: {}", path.display()),
                    Err(e) => {
                        error!(error = %e, "Snapshot failed");
                        format!("Error: {}", e)
                    }
                });
            }
            'r' => {
                show_help = false;
                message = Some(toggle_recording(session, config));
            }
            _ => {}
        }
    }

    Ok(())
}

fn toggle_recording(session: &mut Session, config: &Config) -> String {
    if session.is_recording() {
        return match session.stop_recording() {
            Ok(path) => format!("Recording saved: {}", path.display()),
            Err(e) => {
                error!(error = %e, "Failed to stop recording");
                format!("Error: {}", e)
            }
        };
    }
    let codec = config.recording_codec;
    let started = session.start_recording(Box::new(move |path, width, height, fps| {
        VideoRecorder::start(path, width, height, fps, codec)
            .map(|recorder| Box::new(recorder) as Box<dyn FrameSink>)
    }));
    match started {
        Ok(path) => format!("Recording to {}", path.display()),
        Err(e) => {
            error!(error = %e, "Failed to start recording");
            format!("Error: {}", e)
        }
    }
}

/// Apply an adjustment key; returns false for keys that are not adjustments
pub fn adjust_for_key(settings: &mut AdjustmentSettings, key: char) -> bool {
    let step = adjust::KEY_STEP;
    let limit = adjust::OFFSET_LIMIT;
    match key {
        'c' => settings.contrast = (settings.contrast + step).min(limit),
        'C' => settings.contrast = (settings.contrast - step).max(-limit),
        'e' => settings.exposure = (settings.exposure + step).min(limit),
        'E' => settings.exposure = (settings.exposure - step).max(-limit),
        's' => {
            settings.sharpen = (settings.sharpen + step as u32).min(adjust::SHARPEN_MAX);
        }
        'S' => settings.sharpen = settings.sharpen.saturating_sub(step as u32),
        'f' => settings.flip = !settings.flip,
        'g' => settings.grayscale = !settings.grayscale,
        'd' => settings.edges = !settings.edges,
        'x' => settings.faces = !settings.faces,
        '0' => *settings = AdjustmentSettings::default(),
        _ => return false,
    }
    true
}

fn status_message(session: &Session) -> String {
    let settings = session.settings();
    let mut msg = format!(
        "contrast {:+} | exposure {:+} | sharpen {}",
        settings.contrast, settings.exposure, settings.sharpen
    );
    for (on, name) in [
        (settings.flip, "flip"),
        (settings.grayscale, "gray"),
        (settings.edges, "edges"),
        (settings.faces && session.cascades_loaded(), "faces"),
    ] {
        if on {
            msg.push_str(" | ");
            msg.push_str(name);
        }
    }
    if session.is_recording() {
        msg.push_str(" | ● REC");
    }
    msg.push_str(" | 'h' help");
    msg
}

fn help_message() -> String {
    "c/C contrast | e/E exposure | s/S sharpen | f flip | g gray | d edges | x faces | \
     0 reset | p snapshot | r record | h help | q quit"
        .to_string()
}

/// Renders a frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a Frame>,
    camera_active: bool,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame else {
            let msg = if self.camera_active {
                "Waiting for camera..."
            } else {
                "Camera stopped"
            };
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        let (width, height) = frame.dimensions();
        let (display_width, display_height) = fit_cells(width, height, area.width, area.height);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height as f64 * 2.0);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

/// Cell size of a `width`×`height` frame fitted into `cols`×`rows` cells,
/// where each cell holds two vertical pixels
pub fn fit_cells(width: u32, height: u32, cols: u16, rows: u16) -> (u16, u16) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let aspect = width as f64 / height as f64;
    let term_width = cols as f64;
    let term_height = rows as f64 * 2.0;

    if term_width / term_height > aspect {
        // Terminal is wider - fit to height
        let w = term_height * aspect;
        (w as u16, rows)
    } else {
        // Terminal is taller - fit to width
        let h = term_width / aspect;
        (cols, (h / 2.0) as u16)
    }
}

fn sample_pixel(frame: &Frame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    match frame {
        Frame::Color(image) => {
            let [r, g, b] = image.get_pixel(x, y).0;
            Color::Rgb(r, g, b)
        }
        Frame::Gray(image) => {
            let v = image.get_pixel(x, y).0[0];
            Color::Rgb(v, v, v)
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_keys_step_and_clamp() {
        let mut settings = AdjustmentSettings::default();
        for _ in 0..15 {
            assert!(adjust_for_key(&mut settings, 'c'));
        }
        assert_eq!(settings.contrast, adjust::OFFSET_LIMIT);
        assert!(adjust_for_key(&mut settings, 'E'));
        assert_eq!(settings.exposure, -adjust::KEY_STEP);
        assert!(adjust_for_key(&mut settings, 'S'));
        assert_eq!(settings.sharpen, 0);
        assert!(adjust_for_key(&mut settings, 'd'));
        assert!(settings.edges);
    }

    #[test]
    fn test_reset_key_restores_neutral() {
        let mut settings = AdjustmentSettings {
            contrast: 30,
            flip: true,
            ..Default::default()
        };
        assert!(adjust_for_key(&mut settings, '0'));
        assert!(settings.is_neutral());
    }

    #[test]
    fn test_non_adjustment_keys_are_ignored() {
        let mut settings = AdjustmentSettings::default();
        for key in ['p', 'r', 'q', 'h'] {
            assert!(!adjust_for_key(&mut settings, key));
        }
        assert!(settings.is_neutral());
    }

    #[test]
    fn test_fit_cells_keeps_aspect() {
        // 4:3 frame in an 80x24 terminal (80x48 pixels) is height bound
        assert_eq!(fit_cells(640, 480, 80, 24), (64, 24));
        // Very wide frame is width bound
        assert_eq!(fit_cells(1000, 100, 80, 24), (80, 4));
    }
}
