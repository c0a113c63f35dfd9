// SPDX-License-Identifier: GPL-3.0-only

//! Still capture from the drawing surface
//!
//! Capture reads what was rendered, never the raw stream. The surface is
//! copied synchronously (between two render steps) and only that copy is
//! encoded, so a frame rendered while encoding runs cannot leak into the
//! result.

use super::encoding::{EncodingFormat, PhotoEncoder};
use crate::constants::capture::DEFAULT_QUALITY;
use crate::errors::CaptureError;
use crate::pipelines::render::DrawingSurface;
use crate::storage::Blob;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info};

/// Frozen copy of the surface at capture time
#[derive(Debug, Clone)]
pub struct SurfaceSnapshot {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
    /// Epoch milliseconds when the copy was taken
    pub timestamp_ms: i64,
}

/// Encoded still plus metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub blob: Blob,
    pub width: u32,
    pub height: u32,
    /// Epoch milliseconds
    pub timestamp_ms: i64,
}

/// Snapshot encoder
///
/// Format and quality are chosen per instance in [`SnapshotCapture::new`]
/// rather than per call; build another instance (it is `Copy`) to capture
/// the same surface in a different format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotCapture {
    encoder: PhotoEncoder,
}

impl Default for SnapshotCapture {
    fn default() -> Self {
        Self::new(EncodingFormat::Jpeg, DEFAULT_QUALITY)
    }
}

impl SnapshotCapture {
    pub fn new(format: EncodingFormat, quality: f32) -> Self {
        Self {
            encoder: PhotoEncoder::new(format, quality),
        }
    }

    pub fn format(&self) -> EncodingFormat {
        self.encoder.format()
    }

    /// Copy the surface, failing if it has no area
    pub fn snapshot(surface: &DrawingSurface) -> Result<SurfaceSnapshot, CaptureError> {
        if surface.is_empty() {
            return Err(CaptureError::NotReady {
                width: surface.width(),
                height: surface.height(),
            });
        }
        debug!(size = %surface.dimensions(), "Surface snapshot taken");
        Ok(SurfaceSnapshot {
            width: surface.width(),
            height: surface.height(),
            pixels: Arc::from(surface.pixels()),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Encode a snapshot off the async thread
    pub async fn encode(&self, snapshot: SurfaceSnapshot) -> Result<CaptureResult, CaptureError> {
        let encoder = self.encoder;
        info!(
            width = snapshot.width,
            height = snapshot.height,
            format = %encoder.format(),
            "Encoding capture"
        );

        let pixels = Arc::clone(&snapshot.pixels);
        let (width, height) = (snapshot.width, snapshot.height);
        let encoded = tokio::task::spawn_blocking(move || encoder.encode(&pixels, width, height))
            .await
            .map_err(|e| CaptureError::Encoding(format!("Encoding task error: {}", e)))??;

        Ok(CaptureResult {
            blob: Blob::new(encoded.data, encoded.format.mime_type()),
            width: snapshot.width,
            height: snapshot.height,
            timestamp_ms: snapshot.timestamp_ms,
        })
    }

    /// Snapshot the surface now and encode it
    ///
    /// The surface is read before this returns, so the future does not
    /// borrow it.
    pub fn capture(
        &self,
        surface: &DrawingSurface,
    ) -> BoxFuture<'static, Result<CaptureResult, CaptureError>> {
        let snapshot = Self::snapshot(surface);
        let this = *self;
        async move { this.encode(snapshot?).await }.boxed()
    }
}
