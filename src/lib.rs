// SPDX-License-Identifier: MPL-2.0

//! VisLab - An image processing workbench for the COSMIC desktop
//!
//! A still image can be loaded and run through a table of classic
//! computer-vision operations, or a camera can be started and its frames
//! adjusted live, recorded and snapshotted.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Main application logic and UI
//! - [`backends`]: Frame sources (camera capture, image files)
//! - [`detect`]: Haar cascade face and eye detection
//! - [`media`]: Frame type, drawing, linear filters and display scaling
//! - [`ops`]: The operation table for still images
//! - [`pipelines`]: Live adjustments, snapshot and video persistence
//! - [`session`]: Shared state driven by the GUI, terminal and CLI
//! - [`tools`]: Interactive crop, mask, watershed and preview modes
//! - [`config`]: User configuration handling
//! - [`storage`]: Output locations and file naming
//!
//! # Example
//!
//! ```ignore
//! // This is a GUI application, typically run via:
//! // vislab
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod detect;
pub mod errors;
pub mod i18n;
pub mod media;
pub mod ops;
pub mod pipelines;
pub mod session;
pub mod storage;
pub mod terminal;
pub mod tools;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use media::Frame;
pub use session::Session;
