// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera access
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        Render / Capture / Gallery            │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  Camera traits   │  │ Virtual camera  │  │
//! │  │  + session       │◄─┤ (in-memory host)│  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Host traits, stream request profile and the stream session
//! - [`virtual_camera`]: In-memory host used by the CLI and tests

pub mod camera;
pub mod virtual_camera;
