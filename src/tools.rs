// SPDX-License-Identifier: MPL-2.0

//! Interactive tool modes
//!
//! Cropping, object masking, watershed marking and slider previews collect
//! input while the rest of the interface stays live. Pointer positions arrive
//! already mapped to image coordinates. Confirming turns the collected input
//! into an [`Operation`]; cancelling simply drops the mode.

use crate::constants::{ops as op_consts, preview};
use crate::errors::{AppError, AppResult};
use crate::media::presentation::fit_within;
use crate::media::{Frame, draw};
use crate::ops::{OpContext, Operation, OperationOutput, PreviewKind, Selection, ToolKind};
use image::imageops::FilterType;
use image::{GrayImage, Luma, Rgb, RgbImage};
use tracing::debug;

/// Rubber-band rectangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectSelection {
    anchor: Option<(u32, u32)>,
    corner: Option<(u32, u32)>,
    dragging: bool,
}

impl RectSelection {
    pub fn press(&mut self, point: (u32, u32)) {
        self.anchor = Some(point);
        self.corner = Some(point);
        self.dragging = true;
    }

    pub fn drag(&mut self, point: (u32, u32)) {
        if self.dragging {
            self.corner = Some(point);
        }
    }

    pub fn release(&mut self, point: (u32, u32)) {
        if self.dragging {
            self.corner = Some(point);
            self.dragging = false;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Current rectangle; empty until the pointer has moved
    pub fn selection(&self) -> Selection {
        match (self.anchor, self.corner) {
            (Some(a), Some(b)) => Selection::from_corners(a, b),
            _ => Selection::default(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Watershed marker class painted by the brush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerLabel {
    #[default]
    Foreground,
    Background,
}

impl MarkerLabel {
    pub fn value(&self) -> u8 {
        match self {
            MarkerLabel::Foreground => 1,
            MarkerLabel::Background => 2,
        }
    }

    pub fn color(&self) -> Rgb<u8> {
        match self {
            MarkerLabel::Foreground => draw::GREEN,
            MarkerLabel::Background => draw::BLUE,
        }
    }
}

/// Freehand marker painting for the interactive watershed
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCanvas {
    markers: GrayImage,
    label: MarkerLabel,
    last: Option<(u32, u32)>,
}

impl MarkerCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            markers: GrayImage::new(width, height),
            label: MarkerLabel::default(),
            last: None,
        }
    }

    pub fn label(&self) -> MarkerLabel {
        self.label
    }

    pub fn set_label(&mut self, label: MarkerLabel) {
        self.label = label;
    }

    pub fn press(&mut self, point: (u32, u32)) {
        self.dab(point);
        self.last = Some(point);
    }

    /// Continue a stroke; dabs are interpolated so fast drags leave no holes
    pub fn drag(&mut self, point: (u32, u32)) {
        let Some(last) = self.last else {
            return;
        };
        let (dx, dy) = (point.0 as f32 - last.0 as f32, point.1 as f32 - last.1 as f32);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let x = (last.0 as f32 + dx * t).round() as u32;
            let y = (last.1 as f32 + dy * t).round() as u32;
            self.dab((x, y));
        }
        self.last = Some(point);
    }

    pub fn release(&mut self) {
        self.last = None;
    }

    /// A stroke is in progress
    pub fn is_painting(&self) -> bool {
        self.last.is_some()
    }

    fn dab(&mut self, point: (u32, u32)) {
        imageproc::drawing::draw_filled_circle_mut(
            &mut self.markers,
            (point.0 as i32, point.1 as i32),
            op_consts::BRUSH_RADIUS,
            Luma([self.label.value()]),
        );
    }

    pub fn has_markers(&self) -> bool {
        self.markers.iter().any(|&m| m != 0)
    }

    pub fn markers(&self) -> &GrayImage {
        &self.markers
    }

    pub fn clear(&mut self) {
        self.markers.iter_mut().for_each(|m| *m = 0);
        self.last = None;
    }

    /// Base image with painted strokes on top
    pub fn overlay(&self, base: &RgbImage) -> RgbImage {
        let mut out = base.clone();
        for (pixel, marker) in out.pixels_mut().zip(self.markers.pixels()) {
            match marker.0[0] {
                1 => *pixel = MarkerLabel::Foreground.color(),
                2 => *pixel = MarkerLabel::Background.color(),
                _ => {}
            }
        }
        out
    }
}

/// Slider-driven preview of a parameterised filter
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTool {
    kind: PreviewKind,
    values: Vec<f64>,
    source: Frame,
    rendered: Frame,
}

impl PreviewTool {
    /// Start from the defaults, previewing on a downscaled copy of `original`
    pub fn new(kind: PreviewKind, original: &Frame) -> AppResult<Self> {
        let (w, h) = original.dimensions();
        let source = if w.max(h) > preview::TOOL_MAX {
            let (pw, ph) = fit_within(w, h, preview::TOOL_MAX);
            Frame::color(image::imageops::resize(
                &original.to_rgb(),
                pw,
                ph,
                FilterType::Triangle,
            ))?
        } else {
            original.clone()
        };
        let values = kind.fields().iter().map(|f| f.default).collect();
        let mut tool = Self {
            kind,
            values,
            rendered: source.clone(),
            source,
        };
        tool.render()?;
        Ok(tool)
    }

    pub fn kind(&self) -> PreviewKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Move one slider and refresh the preview
    pub fn set_value(&mut self, index: usize, value: f64) -> AppResult<()> {
        let Some(field) = self.kind.fields().get(index) else {
            return Ok(());
        };
        let mut value = value.clamp(field.min, field.max);
        if field.integer {
            value = value.round();
        }
        if self.values[index] == value {
            return Ok(());
        }
        self.values[index] = value;
        self.render()
    }

    pub fn preview(&self) -> &Frame {
        &self.rendered
    }

    /// The operation to apply to the full-size image
    pub fn operation(&self) -> AppResult<Operation> {
        Operation::from_values(self.kind.operation_kind(), &self.values)
    }

    fn render(&mut self) -> AppResult<()> {
        let output = self.operation()?.run(&self.source, &OpContext::default())?;
        if let OperationOutput::Single(frame) = output {
            self.rendered = frame;
        }
        debug!(kind = ?self.kind, values = ?self.values, "Preview rendered");
        Ok(())
    }
}

/// Active interactive tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMode {
    Crop(RectSelection),
    MaskObject(RectSelection),
    Watershed(MarkerCanvas),
    Preview(PreviewTool),
}

impl ToolMode {
    /// Enter a pointer-driven tool over an image of the given size
    pub fn for_tool(kind: ToolKind, width: u32, height: u32) -> Self {
        match kind {
            ToolKind::Crop => ToolMode::Crop(RectSelection::default()),
            ToolKind::MaskObject => ToolMode::MaskObject(RectSelection::default()),
            ToolKind::Watershed => ToolMode::Watershed(MarkerCanvas::new(width, height)),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ToolMode::Crop(_) => "Crop: drag a rectangle",
            ToolMode::MaskObject(_) => "Mask object: drag around the object",
            ToolMode::Watershed(_) => "Watershed: paint markers (f foreground, b background)",
            ToolMode::Preview(tool) => match tool.kind() {
                PreviewKind::Blur => "Gaussian blur preview",
                PreviewKind::Canny => "Canny preview",
                PreviewKind::Sharpen => "Sharpen preview",
            },
        }
    }

    pub fn press(&mut self, point: (u32, u32)) {
        match self {
            ToolMode::Crop(rect) | ToolMode::MaskObject(rect) => rect.press(point),
            ToolMode::Watershed(canvas) => canvas.press(point),
            ToolMode::Preview(_) => {}
        }
    }

    pub fn drag(&mut self, point: (u32, u32)) {
        match self {
            ToolMode::Crop(rect) | ToolMode::MaskObject(rect) => rect.drag(point),
            ToolMode::Watershed(canvas) => canvas.drag(point),
            ToolMode::Preview(_) => {}
        }
    }

    pub fn release(&mut self, point: (u32, u32)) {
        match self {
            ToolMode::Crop(rect) | ToolMode::MaskObject(rect) => rect.release(point),
            ToolMode::Watershed(canvas) => canvas.release(),
            ToolMode::Preview(_) => {}
        }
    }

    /// Discard collected input but stay in the mode
    pub fn clear(&mut self) {
        match self {
            ToolMode::Crop(rect) | ToolMode::MaskObject(rect) => rect.clear(),
            ToolMode::Watershed(canvas) => canvas.clear(),
            ToolMode::Preview(_) => {}
        }
    }

    /// What the tool pane should show on top of `base`
    pub fn overlay(&self, base: &Frame) -> Frame {
        let draw_rect = |rect: &RectSelection| {
            let mut canvas = base.to_rgb();
            let sel = rect.selection();
            if !sel.is_empty() {
                draw::rect(
                    &mut canvas,
                    sel.x as i32,
                    sel.y as i32,
                    sel.width,
                    sel.height,
                    draw::GREEN,
                    2,
                );
            }
            canvas
        };
        let rgb = match self {
            ToolMode::Crop(rect) | ToolMode::MaskObject(rect) => draw_rect(rect),
            ToolMode::Watershed(canvas) => canvas.overlay(&base.to_rgb()),
            ToolMode::Preview(tool) => return tool.preview().clone(),
        };
        Frame::Color(rgb)
    }

    /// Turn the collected input into an operation
    ///
    /// An empty rectangle or a blank marker canvas counts as a cancel.
    pub fn confirm(&self) -> AppResult<Operation> {
        match self {
            ToolMode::Crop(rect) => {
                let selection = non_empty(rect.selection())?;
                Ok(Operation::Crop { selection })
            }
            ToolMode::MaskObject(rect) => {
                let selection = non_empty(rect.selection())?;
                Ok(Operation::MaskObject { selection })
            }
            ToolMode::Watershed(canvas) => {
                if !canvas.has_markers() {
                    return Err(AppError::Cancelled);
                }
                Ok(Operation::WatershedMarkers {
                    markers: canvas.markers().clone(),
                })
            }
            ToolMode::Preview(tool) => tool.operation(),
        }
    }
}

fn non_empty(selection: Selection) -> AppResult<Selection> {
    if selection.is_empty() {
        Err(AppError::Cancelled)
    } else {
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_selection_follows_drag() {
        let mut rect = RectSelection::default();
        rect.press((30, 5));
        rect.drag((10, 25));
        assert!(rect.is_dragging());
        rect.release((12, 20));
        assert!(!rect.is_dragging());
        assert_eq!(
            rect.selection(),
            Selection {
                x: 12,
                y: 5,
                width: 18,
                height: 15
            }
        );
    }

    #[test]
    fn test_click_without_drag_cancels() {
        let mut mode = ToolMode::for_tool(ToolKind::Crop, 50, 50);
        mode.press((10, 10));
        mode.release((10, 10));
        assert_eq!(mode.confirm().unwrap_err(), AppError::Cancelled);
    }

    #[test]
    fn test_marker_strokes_are_continuous() {
        let mut canvas = MarkerCanvas::new(100, 20);
        canvas.press((10, 10));
        canvas.drag((80, 10));
        canvas.release();
        assert!((10..=80).all(|x| canvas.markers().get_pixel(x, 10).0[0] == 1));

        canvas.set_label(MarkerLabel::Background);
        canvas.press((90, 10));
        assert_eq!(canvas.markers().get_pixel(90, 10).0[0], 2);
        // Dragging after release does not paint
        canvas.release();
        canvas.drag((95, 2));
        assert_eq!(canvas.markers().get_pixel(95, 2).0[0], 0);
    }

    #[test]
    fn test_watershed_confirm_needs_markers() {
        let mut mode = ToolMode::for_tool(ToolKind::Watershed, 20, 20);
        assert_eq!(mode.confirm().unwrap_err(), AppError::Cancelled);
        mode.press((5, 5));
        mode.release((5, 5));
        assert!(matches!(
            mode.confirm(),
            Ok(Operation::WatershedMarkers { .. })
        ));
    }

    #[test]
    fn test_preview_tracks_slider_values() {
        let original = Frame::color(RgbImage::from_fn(40, 30, |x, _| {
            Rgb([if x < 20 { 0 } else { 255 }; 3])
        }))
        .unwrap();
        let mut tool = PreviewTool::new(PreviewKind::Canny, &original).unwrap();
        assert!(tool.preview().is_gray());
        tool.set_value(0, 300.0).unwrap();
        assert_eq!(tool.values()[0], 255.0);
        assert_eq!(
            tool.operation().unwrap(),
            Operation::Canny {
                low: 200,
                high: 200
            }
        );
    }

    #[test]
    fn test_preview_downscales_large_images() {
        let original = Frame::color(RgbImage::new(1000, 500)).unwrap();
        let tool = PreviewTool::new(PreviewKind::Blur, &original).unwrap();
        assert_eq!(tool.preview().dimensions(), (500, 250));
    }
}
