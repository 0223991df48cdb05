// SPDX-License-Identifier: MPL-2.0

//! Media primitives shared by the camera, the still-image operations and the
//! persistence sinks
//!
//! - [`draw`]: thick annotation outlines
//! - [`frame`]: the [`Frame`] raster type (3-channel colour or 1-channel intensity)
//! - [`kernel`]: floating-point linear filters
//! - [`presentation`]: scaling frames into display surfaces

pub mod draw;
pub mod frame;
pub mod kernel;
pub mod presentation;

pub use frame::Frame;
