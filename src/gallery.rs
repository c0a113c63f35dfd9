// SPDX-License-Identifier: GPL-3.0-only

//! In-memory gallery of captures
//!
//! Every entry holds a live object URL. Handles are released only by
//! [`AssetGallery::remove`], [`AssetGallery::clear`] or dropping the gallery.

use crate::errors::{BestEffort, SkipReason};
use crate::pipelines::photo::CaptureResult;
use crate::storage::{Blob, BlobRegistry, ObjectUrl};
use tracing::{debug, info, warn};

/// One stored capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub url: ObjectUrl,
    pub blob: Blob,
    pub width: u32,
    pub height: u32,
    /// Epoch milliseconds
    pub timestamp_ms: i64,
}

#[derive(Debug, Default)]
pub struct AssetGallery {
    registry: BlobRegistry,
    entries: Vec<GalleryEntry>,
}

impl AssetGallery {
    /// Gallery with its own handle registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Gallery minting handles in a shared registry
    pub fn with_registry(registry: BlobRegistry) -> Self {
        Self {
            registry,
            entries: Vec::new(),
        }
    }

    pub fn registry(&self) -> &BlobRegistry {
        &self.registry
    }

    /// Store a capture under a fresh handle
    pub fn add(&mut self, capture: CaptureResult) -> GalleryEntry {
        let url = self.registry.create_object_url(capture.blob.clone());
        let entry = GalleryEntry {
            url,
            blob: capture.blob,
            width: capture.width,
            height: capture.height,
            timestamp_ms: capture.timestamp_ms,
        };
        info!(url = %entry.url, width = entry.width, height = entry.height, "Capture added to gallery");
        self.entries.push(entry.clone());
        entry
    }

    /// Entries in insertion order
    pub fn get_all(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn get_latest(&self) -> Option<&GalleryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop one entry and release its handle
    pub fn remove(&mut self, url: &ObjectUrl) -> Option<GalleryEntry> {
        let index = self.entries.iter().position(|e| &e.url == url)?;
        let entry = self.entries.remove(index);
        if let Err(e) = self.registry.revoke(&entry.url) {
            warn!(error = %e, "Failed to revoke gallery handle");
        }
        debug!(url = %entry.url, "Gallery entry removed");
        Some(entry)
    }

    /// Release every handle, then empty the gallery
    ///
    /// Release failures are absorbed so every handle gets its attempt.
    pub fn clear(&mut self) -> BestEffort {
        if self.entries.is_empty() {
            return BestEffort::Skipped(SkipReason::AlreadyStopped);
        }

        let failures: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| self.registry.revoke(&entry.url).err())
            .map(|e| e.to_string())
            .collect();
        let count = self.entries.len();
        self.entries.clear();

        if failures.is_empty() {
            info!(count, "Gallery cleared");
            BestEffort::Applied
        } else {
            warn!(count, failed = failures.len(), "Gallery cleared with release failures");
            BestEffort::Ignored(failures.join("; "))
        }
    }
}

impl Drop for AssetGallery {
    fn drop(&mut self) {
        self.clear();
    }
}
