// SPDX-License-Identifier: GPL-3.0-only

//! Drawing surface: the single source of truth for what is on screen

use crate::backends::camera::types::{CameraFrame, Dimensions};
use tracing::debug;

/// Tightly packed RGBA pixel buffer
///
/// Written only by the frame processor. Capture reads it between render
/// steps, so what gets encoded is exactly what was last drawn.
#[derive(Debug, Clone, Default)]
pub struct DrawingSurface {
    size: Dimensions,
    pixels: Vec<u8>,
}

impl DrawingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface of the given size, cleared to transparent black
    pub fn with_size(size: Dimensions) -> Self {
        Self {
            size,
            pixels: vec![0; size.rgba_len()],
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// True while there is nothing to capture
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Match the surface to `size`, returning whether it changed
    ///
    /// Resizing clears the contents, as a canvas does.
    pub fn conform(&mut self, size: Dimensions) -> bool {
        if self.size == size {
            return false;
        }
        debug!(from = %self.size, to = %size, "Conforming drawing surface");
        self.size = size;
        self.pixels.clear();
        self.pixels.resize(size.rgba_len(), 0);
        true
    }

    /// Copy a frame in at its native pixel dimensions
    ///
    /// A frame whose buffer length disagrees with its size is refused and
    /// the surface is left untouched.
    pub fn draw(&mut self, frame: &CameraFrame) -> bool {
        let size = frame.dimensions();
        if frame.data.len() != size.rgba_len() {
            return false;
        }
        self.conform(size);
        self.pixels.copy_from_slice(&frame.data);
        true
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}
