// SPDX-License-Identifier: GPL-3.0-only

//! Interactive tool handlers
//!
//! Pointer events arrive in canvas coordinates and are mapped back to pixels
//! of the original before they reach the active tool.

use crate::app::state::{AppModel, Message};
use crate::tools::{MarkerLabel, ToolMode};
use cosmic::Task;
use cosmic::iced::Point;
use tracing::debug;

impl AppModel {
    pub(crate) fn handle_tool_pointer_moved(&mut self, point: Point) -> Task<cosmic::Action<Message>> {
        self.pointer = Some(point);
        let Some(pixel) = self.tool_point(point) else {
            return Task::none();
        };
        let dragging = match self.session.tool() {
            Some(ToolMode::Crop(rect)) | Some(ToolMode::MaskObject(rect)) => rect.is_dragging(),
            Some(ToolMode::Watershed(canvas)) => canvas.is_painting(),
            _ => false,
        };
        if dragging && let Some(tool) = self.session.tool_mut() {
            tool.drag(pixel);
            self.refresh_tool();
        }
        Task::none()
    }

    pub(crate) fn handle_tool_pointer_pressed(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(pixel) = self.pointer.and_then(|p| self.tool_point(p)) else {
            return Task::none();
        };
        if let Some(tool) = self.session.tool_mut() {
            tool.press(pixel);
            self.refresh_tool();
        }
        Task::none()
    }

    pub(crate) fn handle_tool_pointer_released(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(pixel) = self.pointer.and_then(|p| self.tool_point(p)) else {
            return Task::none();
        };
        if let Some(tool) = self.session.tool_mut() {
            tool.release(pixel);
            self.refresh_tool();
        }
        Task::none()
    }

    pub(crate) fn handle_tool_slider(
        &mut self,
        index: usize,
        value: f64,
    ) -> Task<cosmic::Action<Message>> {
        let result = match self.session.tool_mut() {
            Some(ToolMode::Preview(preview)) => preview.set_value(index, value),
            _ => return Task::none(),
        };
        match result {
            Ok(()) => self.refresh_tool(),
            Err(err) => self.report_error("Preview failed", err),
        }
        Task::none()
    }

    pub(crate) fn handle_set_marker_label(
        &mut self,
        label: MarkerLabel,
    ) -> Task<cosmic::Action<Message>> {
        if let Some(ToolMode::Watershed(canvas)) = self.session.tool_mut() {
            canvas.set_label(label);
            debug!(?label, "Marker label selected");
        }
        Task::none()
    }

    pub(crate) fn handle_tool_clear(&mut self) -> Task<cosmic::Action<Message>> {
        if let Some(tool) = self.session.tool_mut() {
            tool.clear();
            self.refresh_tool();
        }
        Task::none()
    }

    /// Leave the tool and run what it collected on the full-size original
    pub(crate) fn handle_tool_confirm(&mut self) -> Task<cosmic::Action<Message>> {
        if self.session.tool().is_none() || self.busy.is_some() {
            return Task::none();
        }
        let operation = self.session.take_tool_operation();
        self.pointer = None;
        self.refresh_tool();
        match operation {
            Ok(operation) => self.run_operation(operation),
            Err(err) => {
                self.report_error("Tool produced no operation", err);
                Task::none()
            }
        }
    }

    pub(crate) fn handle_tool_cancel(&mut self) -> Task<cosmic::Action<Message>> {
        self.session.cancel_tool();
        self.pointer = None;
        self.refresh_tool();
        Task::none()
    }
}
