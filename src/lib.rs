// SPDX-License-Identifier: GPL-3.0-only

//! Camera Pipeline - real-time camera frame processing and capture
//!
//! This library acquires a live camera stream, renders every frame through
//! exposure simulation and a tonal filter (optionally a 3D color LUT), and
//! captures stills that match the rendered pixels exactly.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera host traits, stream session and the virtual camera
//! - [`media`]: Color lookup tables
//! - [`pipelines`]: Render loop and still capture pipelines
//! - [`gallery`]: In-memory capture gallery
//! - [`storage`]: Blobs and their object URL handles
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use camera_pipeline::backends::camera::{FacingMode, StreamSession};
//! use camera_pipeline::backends::virtual_camera::{FramePattern, VirtualDevices, VirtualVideoSink};
//! use camera_pipeline::backends::camera::Dimensions;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), camera_pipeline::AppError> {
//! let sink = Arc::new(VirtualVideoSink::new(FramePattern::Gradient {
//!     size: Dimensions::new(1280, 720),
//! }));
//! let session = StreamSession::new(Arc::new(VirtualDevices::new()), sink);
//! session.start(FacingMode::Environment).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod gallery;
pub mod media;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{ConstraintProfile, FacingMode, StreamSession};
pub use config::Config;
pub use errors::{AppError, AppResult, BestEffort};
pub use gallery::{AssetGallery, GalleryEntry};
pub use media::ColorLut;
pub use pipelines::photo::{CaptureResult, SnapshotCapture};
pub use pipelines::render::{FilterType, FrameProcessor};
