// SPDX-License-Identifier: MPL-2.0

//! Main application module for VisLab
//!
//! This module contains the application state, message handling and UI
//! rendering of the workbench.
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message, ContextPage, etc.)
//! - `handlers`: Message handlers grouped by domain
//! - `settings`: Settings drawer UI
//! - `view`: Main view rendering (sidebar, panes, tool canvas, results)
//! - `update`: Message dispatch

mod handlers;
mod settings;
mod state;
mod update;
mod view;

use crate::backends::enumerate_cameras;
use crate::config::Config;
use crate::constants::{RecordingCodec, app_info, preview, timing};
use crate::detect::FaceDetector;
use crate::errors::AppError;
use crate::fl;
use crate::media::presentation::{fit_within, image_handle, to_image_coords};
use crate::session::Session;
use crate::storage::OutputDirs;
use cosmic::app::context_drawer;
use cosmic::iced::{Point, Subscription, event, keyboard};
use cosmic::widget::{self, about::About};
use cosmic::{Element, Task};
pub use state::{AppModel, Banner, ContextPage, Message, PromptOutcome, PromptState};
use tracing::{error, info, warn};

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = app_info::APP_ID;

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let about = About::default()
            .name(fl!("app-title"))
            .version(app_info::version())
            .links([(fl!("repository"), app_info::REPOSITORY)])
            .license(env!("CARGO_PKG_LICENSE"));

        let (config_handler, config) = Config::load();

        // Initialize GStreamer early (required before any GStreamer calls)
        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let detector = FaceDetector::load(&config.cascade_path());
        let session = Session::new(OutputDirs::resolve(&config), detector);

        let mut app = AppModel {
            core,
            context_page: ContextPage::default(),
            about,
            config,
            config_handler,
            session,
            available_cameras: Vec::new(),
            camera_dropdown_options: Vec::new(),
            theme_dropdown_options: vec![
                fl!("theme-system"),
                fl!("theme-dark"),
                fl!("theme-light"),
            ],
            codec_dropdown_options: RecordingCodec::ALL
                .iter()
                .map(|c| c.display_name().to_string())
                .collect(),
            camera_opening: false,
            busy: None,
            prompt: None,
            results: None,
            banner: None,
            pointer: None,
            handles: Default::default(),
        };
        app.update_camera_options();

        if !app.session.cascades_loaded() {
            app.banner = Some(Banner::info(fl!("cascades-missing")));
        }

        // Enumerate cameras off the UI thread (device probing can be slow)
        let init_task = Task::perform(
            async {
                tokio::task::spawn_blocking(|| {
                    crate::pipelines::video::check_available_encoders();
                    enumerate_cameras()
                })
                .await
                .unwrap_or_default()
            },
            |cameras| cosmic::Action::App(Message::CamerasEnumerated(cameras)),
        );

        (app, init_task)
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![
            widget::button::icon(widget::icon::from_name("preferences-system-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::Settings))
                .into(),
            widget::button::icon(widget::icon::from_name("help-about-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::About))
                .into(),
        ]
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Self::Message>> {
        if !self.core.window.show_context {
            return None;
        }

        Some(match self.context_page {
            ContextPage::About => context_drawer::about(
                &self.about,
                |url| Message::LaunchUrl(url.to_string()),
                Message::ToggleContextPage(ContextPage::About),
            ),
            ContextPage::Settings => self.settings_view(),
        })
    }

    /// Numeric prompt for the pending operation
    fn dialog(&self) -> Option<Element<'_, Self::Message>> {
        self.prompt_dialog()
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        // Live ticks only while the camera runs
        let camera_sub = if self.session.is_camera_active() {
            cosmic::iced::time::every(timing::CAMERA_TICK).map(|_| Message::CameraTick)
        } else {
            Subscription::none()
        };

        // Keyboard shortcuts for the tool modes
        let tool_keys = if self.session.tool().is_some() {
            event::listen_with(|event, status, _window| {
                if status == event::Status::Captured {
                    return None;
                }
                let event::Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) = event else {
                    return None;
                };
                match key {
                    keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::ToolCancel),
                    keyboard::Key::Named(keyboard::key::Named::Enter) => Some(Message::ToolConfirm),
                    keyboard::Key::Character(ref c) if c.as_str() == "f" => Some(
                        Message::SetMarkerLabel(crate::tools::MarkerLabel::Foreground),
                    ),
                    keyboard::Key::Character(ref c) if c.as_str() == "b" => Some(
                        Message::SetMarkerLabel(crate::tools::MarkerLabel::Background),
                    ),
                    _ => None,
                }
            })
        } else {
            Subscription::none()
        };

        Subscription::batch([config_sub, camera_sub, tool_keys])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}

impl AppModel {
    /// Rebuild the camera dropdown; index 0 is the automatic source
    pub(crate) fn update_camera_options(&mut self) {
        self.camera_dropdown_options = std::iter::once(fl!("camera-automatic"))
            .chain(self.available_cameras.iter().map(|c| c.name.clone()))
            .collect();
        info!(count = self.available_cameras.len(), "Camera options updated");
    }

    /// Dropdown index of the configured camera
    pub(crate) fn current_camera_index(&self) -> usize {
        self.config
            .camera_device
            .as_ref()
            .and_then(|path| self.available_cameras.iter().position(|c| &c.path == path))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Rebuild the original and processed pane handles
    ///
    /// While the camera runs the processed pane shows the live frame.
    pub(crate) fn refresh_panes(&mut self) {
        let still = self.config.preview_size;
        self.handles.original = self.session.original().map(|f| image_handle(f, still));
        self.handles.processed = if self.session.is_camera_active() {
            let live = self.config.live_preview_size;
            self.session.live_frame().map(|f| image_handle(f, live))
        } else {
            self.session.processed().map(|f| image_handle(f, still))
        };
        self.refresh_tool();
    }

    /// Redraw the tool canvas after its input changed
    pub(crate) fn refresh_tool(&mut self) {
        self.handles.tool = match (self.session.tool(), self.session.original()) {
            (Some(tool), Some(original)) => {
                let canvas = tool.overlay(original);
                let displayed = fit_within(canvas.width(), canvas.height(), preview::TOOL_MAX);
                Some((image_handle(&canvas, preview::TOOL_MAX), displayed))
            }
            _ => None,
        };
    }

    /// Pointer position on the tool canvas in original image pixels
    pub(crate) fn tool_point(&self, point: Point) -> Option<(u32, u32)> {
        let (_, displayed) = self.handles.tool.as_ref()?;
        let (w, h) = self.session.original()?.dimensions();
        let (x, y) = to_image_coords((point.x, point.y), *displayed, (w, h));
        Some((
            x.clamp(0, w.saturating_sub(1) as i32) as u32,
            y.clamp(0, h.saturating_sub(1) as i32) as u32,
        ))
    }

    /// Surface a failed action in the banner; cancellations stay silent
    pub(crate) fn report_error(&mut self, context: &str, err: AppError) {
        if err == AppError::Cancelled {
            return;
        }
        warn!(error = %err, "{}", context);
        self.banner = Some(Banner::error(err.to_string()));
    }
}
