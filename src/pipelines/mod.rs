// SPDX-License-Identifier: MPL-2.0

//! Frame pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Adjust Pipeline  │ ──▶ │ Display pane │
//! │    (RGB)     │     │  - contrast       │     │              │
//! │              │     │  - exposure       │     └──────────────┘
//! │              │     │  - sharpen        │            │
//! │              │     │  - flip / faces   │            ▼
//! │              │     │  - gray / edges   │     ┌──────────────┐
//! └──────────────┘     └───────────────────┘     │ PNG / AVI    │
//!                                                └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`adjust`]: per-frame live adjustments, applied once per camera tick
//! - [`photo`]: timestamped PNG snapshots and exports
//! - [`video`]: AVI recording of processed frames through GStreamer

pub mod adjust;
pub mod photo;
pub mod video;
