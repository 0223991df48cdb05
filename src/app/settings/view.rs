// SPDX-License-Identifier: MPL-2.0

//! Settings drawer view

use crate::app::state::{AppModel, ContextPage, Message};
use crate::config::AppTheme;
use crate::constants::{RecordingCodec, app_info};
use crate::fl;
use cosmic::Element;
use cosmic::app::context_drawer;
use cosmic::iced::{Alignment, Length};
use cosmic::widget;

impl AppModel {
    /// Create the settings view for the context drawer
    pub fn settings_view(&self) -> context_drawer::ContextDrawer<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let theme_index = AppTheme::ALL
            .iter()
            .position(|t| *t == self.config.app_theme);
        let theme_dropdown = widget::dropdown(
            &self.theme_dropdown_options,
            theme_index,
            Message::SetAppTheme,
        );

        // Applies the next time the camera starts
        let camera_dropdown = widget::dropdown(
            &self.camera_dropdown_options,
            Some(self.current_camera_index()),
            Message::SelectCamera,
        );

        let codec_index = RecordingCodec::ALL
            .iter()
            .position(|c| *c == self.config.recording_codec);
        let codec_dropdown = widget::dropdown(
            &self.codec_dropdown_options,
            codec_index,
            Message::SelectCodec,
        );

        let output_row = widget::row()
            .push(
                widget::text::body(self.session.outputs().root().display().to_string())
                    .width(Length::Fill),
            )
            .push(widget::horizontal_space().width(spacing.space_xs))
            .push(widget::button::standard(fl!("open")).on_press(Message::OpenOutputDirectory))
            .align_y(Alignment::Center);

        let cascade_status = if self.session.cascades_loaded() {
            fl!("cascades-loaded", dir = self.config.cascade_dir.clone())
        } else {
            fl!("cascades-not-found", dir = self.config.cascade_dir.clone())
        };

        let heading = |label: String| widget::text(label).size(16).font(cosmic::font::bold());

        let settings_column: Element<'_, Message> = widget::column()
            .push(heading(fl!("theme")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(theme_dropdown)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("camera")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(camera_dropdown)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("recording-codec")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(codec_dropdown)
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("output-directory")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(output_row)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("face-detection")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(widget::text::body(cascade_status))
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(
                widget::text(fl!("version", version = app_info::version()))
                    .size(12)
                    .class(cosmic::theme::Text::Accent),
            )
            .spacing(0)
            .into();

        context_drawer::context_drawer(
            settings_column,
            Message::ToggleContextPage(ContextPage::Settings),
        )
        .title(fl!("settings"))
    }
}
