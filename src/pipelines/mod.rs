// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for rendering and still capture
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  VideoSink   │ ──▶ │  Render Pipeline  │ ──▶ │   Drawing    │
//! │   (RGBA)     │     │  - Exposure       │     │   Surface    │
//! │              │     │  - Filter / LUT   │     │              │
//! └──────────────┘     └───────────────────┘     └──────┬───────┘
//!                                                       │
//!                      ┌───────────────────┐     ┌──────▼───────┐
//!                      │  Photo Pipeline   │ ◀── │   Snapshot   │
//!                      │  - JPEG / PNG     │     │              │
//!                      └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`render`]: Per-frame render loop and its scheduler
//! - [`photo`]: Snapshot capture and encoding

pub mod photo;
pub mod render;
