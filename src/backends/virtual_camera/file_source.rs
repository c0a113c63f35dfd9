// SPDX-License-Identifier: GPL-3.0-only

//! Still images as virtual camera input

use crate::backends::camera::types::CameraFrame;
use crate::errors::{AppError, AppResult};
use std::path::Path;
use tracing::info;

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> AppResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        AppError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    info!(width, height, "Image loaded successfully");

    CameraFrame::from_rgba(width, height, rgba.into_raw())
        .ok_or_else(|| AppError::Other(format!("Image '{}' has inconsistent pixel data", path.display())))
}
