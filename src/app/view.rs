// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! The window is split into a control sidebar and a content area. The
//! content area shows, in order of precedence:
//! - the active interactive tool
//! - a multi-panel result
//! - the original and processed panes (only the live pane while the camera runs)

use crate::app::state::{AppModel, Banner, Message, ResultsView};
use crate::constants::{adjust, ui};
use crate::fl;
use crate::ops::{OperationCategory, PromptField};
use crate::tools::{MarkerLabel, ToolMode};
use cosmic::Element;
use cosmic::iced::{Alignment, Background, Color, Length};
use cosmic::widget;

const LABEL_WIDTH: f32 = 80.0;
const SLIDER_WIDTH: f32 = 150.0;
const VALUE_WIDTH: f32 = 44.0;
const CONTROL_SPACING: u16 = 8;

const ERROR_COLOR: Color = Color::from_rgb(0.85, 0.25, 0.25);

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let content = if let Some(tool) = self.session.tool() {
            self.build_tool_view(tool)
        } else if let Some(results) = &self.results {
            Self::build_results_view(results)
        } else {
            self.build_panes()
        };

        let mut main = widget::column()
            .spacing(spacing.space_s)
            .padding(spacing.space_s)
            .width(Length::Fill)
            .height(Length::Fill);
        if let Some(banner) = &self.banner {
            main = main.push(Self::build_banner(banner));
        }
        if let Some(kind) = self.busy {
            main = main.push(widget::text::body(fl!("running", operation = kind.label())));
        }
        main = main.push(content);

        widget::row()
            .push(self.build_sidebar())
            .push(main)
            .height(Length::Fill)
            .into()
    }

    // =========================================================================
    // Sidebar
    // =========================================================================

    fn build_sidebar(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();
        let idle = self.busy.is_none() && self.session.tool().is_none();
        let has_image = self.session.original().is_some();
        let camera_on = self.session.is_camera_active();

        let mut column = widget::column()
            .spacing(spacing.space_xxs)
            .padding(spacing.space_s)
            .width(Length::Fixed(ui::SIDEBAR_WIDTH));

        // Image
        column = column
            .push(heading(fl!("image")))
            .push(sidebar_button(fl!("load-image"), idle.then_some(Message::LoadImage)))
            .push(sidebar_button(
                fl!("reset-image"),
                (idle && has_image).then_some(Message::ResetImage),
            ))
            .push(sidebar_button(
                fl!("save-result"),
                (has_image && self.busy.is_none()).then_some(Message::SaveResult),
            ));

        // Camera
        column = column
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("camera")));
        column = if camera_on {
            let record_label = if self.session.is_recording() {
                fl!("stop-recording")
            } else {
                fl!("start-recording")
            };
            column
                .push(sidebar_button(fl!("stop-camera"), Some(Message::StopCamera)))
                .push(sidebar_button(record_label, Some(Message::ToggleRecording)))
                .push(sidebar_button(fl!("take-snapshot"), Some(Message::TakeSnapshot)))
                .push(self.build_adjustments())
        } else {
            let label = if self.camera_opening {
                fl!("camera-opening")
            } else {
                fl!("start-camera")
            };
            column.push(sidebar_button(
                label,
                (idle && !self.camera_opening).then_some(Message::StartCamera),
            ))
        };

        // Operations
        for category in OperationCategory::ALL {
            column = column
                .push(widget::vertical_space().height(spacing.space_s))
                .push(heading(category.label().to_string()));
            for kind in category.kinds() {
                column = column.push(sidebar_button(
                    kind.label().to_string(),
                    (idle && has_image).then_some(Message::RunOperation(kind)),
                ));
            }
        }

        widget::scrollable(column).height(Length::Fill).into()
    }

    /// Live adjustment sliders and effect toggles
    fn build_adjustments(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();
        let settings = self.session.settings();
        let limit = adjust::OFFSET_LIMIT as f32;

        widget::column()
            .spacing(spacing.space_xxs)
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(control_row(
                fl!("contrast"),
                settings.contrast.to_string(),
                widget::slider(-limit..=limit, settings.contrast as f32, |v| {
                    Message::SetContrast(v as i32)
                })
                .width(Length::Fixed(SLIDER_WIDTH)),
            ))
            .push(control_row(
                fl!("exposure"),
                settings.exposure.to_string(),
                widget::slider(-limit..=limit, settings.exposure as f32, |v| {
                    Message::SetExposure(v as i32)
                })
                .width(Length::Fixed(SLIDER_WIDTH)),
            ))
            .push(control_row(
                fl!("sharpen"),
                settings.sharpen.to_string(),
                widget::slider(
                    0.0..=adjust::SHARPEN_MAX as f32,
                    settings.sharpen as f32,
                    |v| Message::SetSharpen(v as u32),
                )
                .width(Length::Fixed(SLIDER_WIDTH)),
            ))
            .push(toggle_row(fl!("grayscale"), settings.grayscale, Message::ToggleGrayscale))
            .push(toggle_row(fl!("edges"), settings.edges, Message::ToggleEdges))
            .push(toggle_row(fl!("faces"), settings.faces, Message::ToggleFaces))
            .push(toggle_row(fl!("flip"), settings.flip, Message::ToggleFlip))
            .push(
                widget::button::standard(fl!("reset-adjustments"))
                    .on_press_maybe((!settings.is_neutral()).then_some(Message::ResetAdjustments)),
            )
            .into()
    }

    // =========================================================================
    // Content
    // =========================================================================

    fn build_banner(banner: &Banner) -> Element<'_, Message> {
        let is_error = banner.is_error;
        let text = widget::text::body(banner.text.clone()).width(Length::Fill);
        let dismiss = widget::button::icon(widget::icon::from_name("window-close-symbolic"))
            .on_press(Message::DismissBanner);

        widget::container(
            widget::row()
                .push(text)
                .push(dismiss)
                .align_y(Alignment::Center)
                .spacing(CONTROL_SPACING),
        )
        .padding(8)
        .width(Length::Fill)
        .style(move |theme: &cosmic::Theme| {
            let cosmic = theme.cosmic();
            let background = if is_error {
                Color { a: 0.25, ..ERROR_COLOR }
            } else {
                let bg = cosmic.bg_component_color();
                Color::from_rgba(bg.red, bg.green, bg.blue, bg.alpha)
            };
            widget::container::Style {
                background: Some(Background::Color(background)),
                border: cosmic::iced::Border {
                    radius: cosmic.corner_radii.radius_s.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        })
        .into()
    }

    fn build_panes(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        if self.session.is_camera_active() {
            let title = match self.session.recording_path() {
                Some(path) => fl!(
                    "live-recording",
                    path = path.display().to_string()
                ),
                None => fl!("live"),
            };
            return pane(title, self.handles.processed.as_ref());
        }

        if self.session.original().is_none() {
            return widget::container(widget::text::body(fl!("empty-hint")))
                .center(Length::Fill)
                .into();
        }

        widget::row()
            .push(pane(fl!("original"), self.handles.original.as_ref()))
            .push(pane(fl!("processed"), self.handles.processed.as_ref()))
            .spacing(spacing.space_m)
            .into()
    }

    fn build_results_view(results: &ResultsView) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let panels: Vec<Element<'_, Message>> = results
            .panels
            .iter()
            .map(|(title, handle)| {
                widget::column()
                    .push(widget::image::Image::new(handle.clone()))
                    .push(widget::text::body(title.clone()))
                    .spacing(spacing.space_xxs)
                    .align_x(Alignment::Center)
                    .into()
            })
            .collect();

        let mut column = widget::column()
            .push(heading(results.title.clone()))
            .push(
                widget::flex_row(panels)
                    .column_spacing(spacing.space_s)
                    .row_spacing(spacing.space_s),
            )
            .spacing(spacing.space_s);
        if let Some(note) = &results.note {
            column = column.push(widget::text::body(note.clone()));
        }
        column = column.push(widget::button::standard(fl!("close")).on_press(Message::CloseResults));

        widget::scrollable(column).height(Length::Fill).into()
    }

    fn build_tool_view<'a>(&'a self, tool: &'a ToolMode) -> Element<'a, Message> {
        let spacing = cosmic::theme::spacing();

        let canvas: Element<'_, Message> = match &self.handles.tool {
            Some((handle, (w, h))) => {
                let image = widget::image::Image::new(handle.clone())
                    .width(Length::Fixed(*w as f32))
                    .height(Length::Fixed(*h as f32));
                if matches!(tool, ToolMode::Preview(_)) {
                    image.into()
                } else {
                    widget::mouse_area(image)
                        .on_press(Message::ToolPointerPressed)
                        .on_release(Message::ToolPointerReleased)
                        .on_move(Message::ToolPointerMoved)
                        .into()
                }
            }
            None => widget::Space::new(Length::Shrink, Length::Shrink).into(),
        };

        let mut controls = widget::column().spacing(spacing.space_xxs);
        match tool {
            ToolMode::Preview(preview) => {
                let fields = preview.kind().fields();
                for (index, (field, value)) in fields.iter().zip(preview.values()).enumerate() {
                    controls = controls.push(preview_slider(index, field, *value));
                }
            }
            ToolMode::Watershed(canvas) => {
                let label_button = |label: MarkerLabel, text: String| {
                    let button = if canvas.label() == label {
                        widget::button::suggested(text)
                    } else {
                        widget::button::standard(text)
                    };
                    button.on_press(Message::SetMarkerLabel(label))
                };
                controls = controls.push(
                    widget::row()
                        .push(label_button(MarkerLabel::Foreground, fl!("foreground")))
                        .push(label_button(MarkerLabel::Background, fl!("background")))
                        .push(widget::button::standard(fl!("clear")).on_press(Message::ToolClear))
                        .spacing(CONTROL_SPACING),
                );
            }
            ToolMode::Crop(_) | ToolMode::MaskObject(_) => {
                controls = controls
                    .push(widget::button::standard(fl!("clear")).on_press(Message::ToolClear));
            }
        }

        let confirm_label = if matches!(tool, ToolMode::Preview(_)) {
            fl!("apply")
        } else {
            fl!("confirm")
        };
        let actions = widget::row()
            .push(
                widget::button::suggested(confirm_label)
                    .on_press_maybe(self.busy.is_none().then_some(Message::ToolConfirm)),
            )
            .push(widget::button::standard(fl!("cancel")).on_press(Message::ToolCancel))
            .spacing(CONTROL_SPACING);

        widget::column()
            .push(heading(tool.title().to_string()))
            .push(canvas)
            .push(controls)
            .push(actions)
            .spacing(spacing.space_s)
            .into()
    }

    // =========================================================================
    // Prompt dialog
    // =========================================================================

    /// Numeric input dialog for the pending operation
    pub fn prompt_dialog(&self) -> Option<Element<'_, Message>> {
        let prompt = self.prompt.as_ref()?;
        let spacing = cosmic::theme::spacing();

        let mut fields = widget::column().spacing(spacing.space_xxs);
        for (index, (field, input)) in prompt.fields.iter().zip(&prompt.inputs).enumerate() {
            fields = fields
                .push(widget::text::body(fl!(
                    "prompt-range",
                    label = field.label,
                    min = field.min,
                    max = field.max
                )))
                .push(
                    widget::text_input("", input)
                        .on_input(move |text| Message::PromptInput(index, text))
                        .on_submit(|_| Message::PromptSubmit),
                );
        }
        if let Some(error) = &prompt.error {
            fields = fields.push(
                widget::text::body(error.clone()).class(cosmic::theme::Text::Color(ERROR_COLOR)),
            );
        }

        let dialog = widget::dialog()
            .title(prompt.kind.label())
            .control(fields)
            .primary_action(widget::button::suggested(fl!("apply")).on_press(Message::PromptSubmit))
            .secondary_action(widget::button::standard(fl!("cancel")).on_press(Message::PromptCancel));

        Some(dialog.into())
    }
}

fn heading<'a>(label: String) -> Element<'a, Message> {
    widget::text(label).size(16).font(cosmic::font::bold()).into()
}

fn sidebar_button<'a>(label: String, message: Option<Message>) -> Element<'a, Message> {
    widget::button::standard(label)
        .width(Length::Fixed(ui::OPERATION_BUTTON_WIDTH))
        .on_press_maybe(message)
        .into()
}

fn control_row<'a>(
    label: String,
    value_text: String,
    slider: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    widget::row::with_capacity(3)
        .align_y(Alignment::Center)
        .spacing(CONTROL_SPACING)
        .width(Length::Shrink)
        .push(widget::text(label).size(13).width(Length::Fixed(LABEL_WIDTH)))
        .push(slider.into())
        .push(
            widget::text::body(value_text)
                .width(Length::Fixed(VALUE_WIDTH))
                .align_x(Alignment::End),
        )
        .into()
}

fn toggle_row<'a>(
    label: String,
    value: bool,
    on_toggle: impl Fn(bool) -> Message + 'a,
) -> Element<'a, Message> {
    widget::row()
        .push(widget::text(label).size(13))
        .push(widget::horizontal_space().width(Length::Fill))
        .push(widget::toggler(value).on_toggle(on_toggle))
        .align_y(Alignment::Center)
        .width(Length::Fixed(ui::OPERATION_BUTTON_WIDTH))
        .into()
}

fn preview_slider<'a>(index: usize, field: &PromptField, value: f64) -> Element<'a, Message> {
    let value_text = if field.integer {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    };
    let slider = widget::slider(field.min as f32..=field.max as f32, value as f32, move |v| {
        Message::ToolSlider(index, v as f64)
    })
    .width(Length::Fixed(SLIDER_WIDTH));
    control_row(field.label.to_string(), value_text, slider)
}

fn pane<'a>(title: String, handle: Option<&cosmic::widget::image::Handle>) -> Element<'a, Message> {
    let spacing = cosmic::theme::spacing();
    let body: Element<'a, Message> = match handle {
        Some(handle) => widget::image::Image::new(handle.clone()).into(),
        None => widget::container(widget::text::body(fl!("waiting-for-frame")))
            .center(Length::Fill)
            .into(),
    };
    widget::column()
        .push(heading(title))
        .push(body)
        .spacing(spacing.space_xxs)
        .width(Length::FillPortion(1))
        .into()
}
