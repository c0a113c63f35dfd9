// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! - JPEG (lossy, quality controlled, alpha dropped)
//! - PNG (lossless RGBA)

use crate::constants::capture::DEFAULT_QUALITY;
use crate::errors::CaptureError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncodingFormat::Jpeg => "jpeg",
            EncodingFormat::Png => "png",
        })
    }
}

impl FromStr for EncodingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" | "image/jpeg" => Ok(EncodingFormat::Jpeg),
            "png" | "image/png" => Ok(EncodingFormat::Png),
            other => Err(format!("Unsupported image format '{}'", other)),
        }
    }
}

/// Map a `[0, 1]` quality onto the JPEG encoder's 1..=100 scale
///
/// Out-of-range values clamp; NaN falls back to the default quality.
pub fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_nan() { DEFAULT_QUALITY } else { quality.clamp(0.0, 1.0) };
    ((q * 100.0).round() as u8).clamp(1, 100)
}

/// Encoded image data
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    quality: f32,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(EncodingFormat::Jpeg, DEFAULT_QUALITY)
    }
}

impl PhotoEncoder {
    pub fn new(format: EncodingFormat, quality: f32) -> Self {
        Self { format, quality }
    }

    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// Quality in `[0, 1]`; only affects JPEG
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Encode tightly packed RGBA pixels
    ///
    /// CPU-bound: call from a blocking task.
    pub fn encode(&self, rgba: &[u8], width: u32, height: u32) -> Result<EncodedImage, CaptureError> {
        let data = match self.format {
            EncodingFormat::Jpeg => Self::encode_jpeg(rgba, width, height, jpeg_quality(self.quality))?,
            EncodingFormat::Png => Self::encode_png(rgba, width, height)?,
        };

        if data.is_empty() {
            return Err(CaptureError::Encoding(format!(
                "{} encoder produced no data",
                self.format
            )));
        }
        debug!(size = data.len(), format = %self.format, "Encoding complete");

        Ok(EncodedImage {
            data,
            format: self.format,
            width,
            height,
        })
    }

    /// Encode image as JPEG
    fn encode_jpeg(rgba: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, CaptureError> {
        let rgb: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| CaptureError::Encoding(format!("JPEG encoding failed: {}", e)))?;
        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(rgba, width, height, ExtendedColorType::Rgba8)
            .map_err(|e| CaptureError::Encoding(format!("PNG encoding failed: {}", e)))?;
        Ok(buffer)
    }
}
