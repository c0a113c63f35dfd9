// SPDX-License-Identifier: GPL-3.0-only

//! 3D color lookup tables
//!
//! A LUT of edge `N` is a flattened cube of `N³` RGBA buckets, stored as an
//! image whose pixels are read in row-major order. Bucket `(r, g, b)` lives at
//! byte offset `(r + g·N + b·N²) × 4`.
//!
//! Lookup is nearest-bucket: each channel is floored into `0..N` and the
//! bucket's RGB replaces the pixel's RGB. Alpha is never touched.

use crate::constants::lut::MAX_SIZE;
use crate::errors::LutLoadError;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a LUT image comes from
#[derive(Debug, Clone)]
pub enum LutSource {
    /// Image file on disk
    Path(PathBuf),
    /// Encoded image already in memory
    Bytes(Arc<[u8]>),
}

impl From<PathBuf> for LutSource {
    fn from(path: PathBuf) -> Self {
        LutSource::Path(path)
    }
}

/// Immutable cube data
///
/// A size of 0 means no table: applying it leaves pixels unchanged.
#[derive(Debug, Clone)]
pub struct LutTable {
    size: u32,
    data: Arc<[u8]>,
}

impl Default for LutTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl LutTable {
    /// The "no table loaded" state
    pub fn empty() -> Self {
        Self {
            size: 0,
            data: Arc::from(Vec::new()),
        }
    }

    /// Build a table from decoded RGBA bytes
    ///
    /// Bytes past the `N³ × 4` needed by the cube are dropped.
    pub fn from_rgba(size: u32, data: &[u8]) -> Result<Self, LutLoadError> {
        let expected = Self::byte_len(size)?;
        if data.len() < expected {
            return Err(LutLoadError::TooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            size,
            data: Arc::from(&data[..expected]),
        })
    }

    /// Neutral cube: every bucket holds its own center color
    pub fn identity(size: u32) -> Result<Self, LutLoadError> {
        let len = Self::byte_len(size)?;
        let n = size as usize;
        let level = |i: usize| -> u8 {
            if n == 1 {
                0
            } else {
                ((i * 255 + (n - 1) / 2) / (n - 1)) as u8
            }
        };

        let mut data = Vec::with_capacity(len);
        for b in 0..n {
            for g in 0..n {
                for r in 0..n {
                    data.extend_from_slice(&[level(r), level(g), level(b), 255]);
                }
            }
        }
        Ok(Self {
            size,
            data: Arc::from(data),
        })
    }

    fn byte_len(size: u32) -> Result<usize, LutLoadError> {
        if size == 0 || size > MAX_SIZE {
            return Err(LutLoadError::InvalidSize(size));
        }
        let n = size as usize;
        Ok(n * n * n * 4)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Lay the cube out as an `N² × N` image (row = b, column = r + g·N)
    ///
    /// Row-major reading of the result reproduces the cube order, so the
    /// image can be fed straight back into [`ColorLut::load`].
    pub fn to_image(&self) -> Option<RgbaImage> {
        if self.is_empty() {
            return None;
        }
        RgbaImage::from_raw(self.size * self.size, self.size, self.data.to_vec())
    }

    /// Remap RGBA pixels in place
    pub fn apply(&self, pixels: &mut [u8]) {
        if self.size == 0 {
            return;
        }
        let n = self.size as usize;
        let max = n - 1;
        let table = &self.data[..];

        for px in pixels.chunks_exact_mut(4) {
            let r = (px[0] as usize * max / 255).min(max);
            let g = (px[1] as usize * max / 255).min(max);
            let b = (px[2] as usize * max / 255).min(max);
            let offset = (r + g * n + b * n * n) * 4;
            px[..3].copy_from_slice(&table[offset..offset + 3]);
        }
    }
}

/// Color engine holding the active table
#[derive(Debug, Clone, Default)]
pub struct ColorLut {
    table: LutTable,
}

impl ColorLut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: LutTable) -> Self {
        Self { table }
    }

    /// Fetch and decode a LUT image, replacing the active table
    ///
    /// On any failure the engine falls back to no table (identity) and the
    /// error is returned for the caller to report.
    pub async fn load(&mut self, source: &LutSource, size: u32) -> Result<(), LutLoadError> {
        match Self::fetch_and_decode(source, size).await {
            Ok(table) => {
                info!(size, "LUT loaded");
                self.table = table;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, size, "LUT load failed, using identity");
                self.table = LutTable::empty();
                Err(e)
            }
        }
    }

    async fn fetch_and_decode(source: &LutSource, size: u32) -> Result<LutTable, LutLoadError> {
        // Reject bad sizes before touching the resource
        LutTable::byte_len(size)?;

        let bytes: Arc<[u8]> = match source {
            LutSource::Path(path) => {
                debug!(path = %path.display(), "Reading LUT image");
                tokio::fs::read(path)
                    .await
                    .map(Arc::from)
                    .map_err(|e| LutLoadError::Fetch(format!("{}: {}", path.display(), e)))?
            }
            LutSource::Bytes(bytes) => Arc::clone(bytes),
        };

        tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&bytes)
                .map_err(|e| LutLoadError::Decode(e.to_string()))?;
            let rgba = img.to_rgba8();
            debug!(width = rgba.width(), height = rgba.height(), "LUT image decoded");
            LutTable::from_rgba(size, rgba.as_raw())
        })
        .await
        .map_err(|e| LutLoadError::Decode(format!("decode task failed: {}", e)))?
    }

    /// Remap pixels through the active table; no-op when none is loaded
    pub fn apply(&self, pixels: &mut [u8]) {
        self.table.apply(pixels);
    }

    pub fn is_loaded(&self) -> bool {
        !self.table.is_empty()
    }

    pub fn table(&self) -> &LutTable {
        &self.table
    }

    /// Drop the active table
    pub fn unload(&mut self) {
        self.table = LutTable::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: &RgbaImage) -> Arc<[u8]> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        Arc::from(out.into_inner())
    }

    /// Two-bucket cube whose entries encode their own index
    fn indexed_table() -> LutTable {
        let mut data = Vec::new();
        for i in 0..8u8 {
            data.extend_from_slice(&[i * 10, i * 10 + 1, i * 10 + 2, 255]);
        }
        LutTable::from_rgba(2, &data).unwrap()
    }

    #[test]
    fn test_unloaded_is_identity() {
        let lut = ColorLut::new();
        let original: Vec<u8> = (0..=255).collect();
        let mut pixels = original.clone();
        lut.apply(&mut pixels);
        assert_eq!(pixels, original);
        assert!(!lut.is_loaded());
    }

    #[test]
    fn test_full_identity_cube() {
        let table = LutTable::identity(256).unwrap();
        let original: Vec<u8> = (0..1024u32).map(|i| (i * 7 % 256) as u8).collect();
        let mut pixels = original.clone();
        table.apply(&mut pixels);
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_bucket_lookup_and_alpha() {
        let table = indexed_table();
        // r=255 -> 1, g=0 -> 0, b=255 -> 1: bucket 1 + 0 + 4 = 5
        let mut pixels = vec![255, 0, 255, 77, 10, 200, 0, 3];
        table.apply(&mut pixels);
        assert_eq!(&pixels[0..4], &[50, 51, 52, 77]);
        // r=10 -> 0, g=200 -> 0, b=0 -> 0: bucket 0
        assert_eq!(&pixels[4..8], &[0, 1, 2, 3]);
    }

    #[test]
    fn test_size_bounds() {
        assert!(matches!(LutTable::identity(0), Err(LutLoadError::InvalidSize(0))));
        assert!(matches!(
            LutTable::identity(257),
            Err(LutLoadError::InvalidSize(257))
        ));
        assert!(matches!(
            LutTable::from_rgba(4, &[0u8; 10]),
            Err(LutLoadError::TooSmall {
                expected: 256,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_image_layout() {
        let table = LutTable::identity(4).unwrap();
        let img = table.to_image().unwrap();
        assert_eq!(img.dimensions(), (16, 4));
        // column r + g*N, row b
        assert_eq!(img.get_pixel(3 + 2 * 4, 1).0, [255, 170, 85, 255]);
        assert!(LutTable::empty().to_image().is_none());
    }

    #[tokio::test]
    async fn test_load_from_bytes() {
        let png = encode_png(&indexed_table().to_image().unwrap());
        let mut lut = ColorLut::new();
        lut.load(&LutSource::Bytes(png), 2).await.unwrap();
        assert!(lut.is_loaded());
        assert_eq!(lut.table().data(), indexed_table().data());
    }

    #[tokio::test]
    async fn test_failed_load_resets_to_identity() {
        let mut lut = ColorLut::with_table(indexed_table());
        let err = lut
            .load(&LutSource::Bytes(Arc::from(&b"not an image"[..])), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, LutLoadError::Decode(_)));
        assert!(!lut.is_loaded());

        let mut lut = ColorLut::with_table(indexed_table());
        let err = lut
            .load(&LutSource::Path("/nonexistent/lut.png".into()), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, LutLoadError::Fetch(_)));
        assert!(!lut.is_loaded());
    }

    #[tokio::test]
    async fn test_undersized_image_rejected() {
        let png = encode_png(&LutTable::identity(2).unwrap().to_image().unwrap());
        let mut lut = ColorLut::new();
        let err = lut.load(&LutSource::Bytes(png), 4).await.unwrap_err();
        assert!(matches!(err, LutLoadError::TooSmall { .. }));
    }
}
