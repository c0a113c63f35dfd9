// SPDX-License-Identifier: GPL-3.0-only

//! Media processing utilities
//!
//! # Modules
//!
//! - [`lut`]: 3D color lookup tables loaded from images

pub mod lut;

pub use lut::{ColorLut, LutSource, LutTable};
