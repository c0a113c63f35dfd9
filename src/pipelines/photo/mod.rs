// SPDX-License-Identifier: GPL-3.0-only

//! Async still capture pipeline
//!
//! ```text
//! DrawingSurface → snapshot (sync copy) → encode (blocking task) → CaptureResult
//!       ↓
//! Rendering continues uninterrupted
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Snapshot**: Copy the surface between two render steps
//! 2. **Encoding**: Convert to JPEG/PNG in a blocking task

pub mod capture;
pub mod encoding;

pub use capture::{CaptureResult, SnapshotCapture, SurfaceSnapshot};
pub use encoding::{EncodedImage, EncodingFormat, PhotoEncoder, jpeg_quality};
