// SPDX-License-Identifier: MPL-2.0

//! Frame sources
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        Session / CLI         │
//! └──────────────┬───────────────┘
//!                │ FrameSource
//!     ┌──────────┴──────────┐
//!     ▼                     ▼
//! ┌────────┐          ┌──────────┐
//! │ camera │          │  still   │
//! │ (GStr) │          │ (image)  │
//! └────────┘          └──────────┘
//! ```
//!
//! - [`camera`]: live capture through a GStreamer appsink
//! - [`still`]: decoding image files picked by the user

pub mod camera;
pub mod still;

pub use camera::{CameraDevice, FrameSource, GstCamera, enumerate_cameras};
pub use still::{is_supported_image, load_image};
