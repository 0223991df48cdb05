// SPDX-License-Identifier: GPL-3.0-only

//! Settings UI module
//!
//! Theme, camera source, recording codec, output location and the state
//! of the face detection models.

pub mod view;
