// SPDX-License-Identifier: GPL-3.0-only

//! In-memory blobs and the object URLs that reference them
//!
//! An [`ObjectUrl`] keeps its blob reachable through the registry until it is
//! revoked. Nothing is written to disk.

use crate::constants::OBJECT_URL_PREFIX;
use crate::errors::BlobError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Immutable encoded bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Arc<[u8]>,
    mime_type: &'static str,
}

impl Blob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Transient handle to a registered blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-local table of live object URLs
///
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    urls: Arc<Mutex<HashMap<ObjectUrl, Blob>>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn urls(&self) -> MutexGuard<'_, HashMap<ObjectUrl, Blob>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a fresh handle bound to `blob`
    pub fn create_object_url(&self, blob: Blob) -> ObjectUrl {
        let url = ObjectUrl(format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4()));
        debug!(url = %url, size = blob.len(), "Object URL created");
        self.urls().insert(url.clone(), blob);
        url
    }

    /// Blob behind a live handle
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Blob> {
        self.urls().get(url).cloned()
    }

    /// Invalidate a handle, releasing the registry's reference to its blob
    pub fn revoke(&self, url: &ObjectUrl) -> Result<(), BlobError> {
        match self.urls().remove(url) {
            Some(_) => {
                debug!(url = %url, "Object URL revoked");
                Ok(())
            }
            None => Err(BlobError::UnknownUrl(url.to_string())),
        }
    }

    /// Number of live handles
    pub fn live_count(&self) -> usize {
        self.urls().len()
    }
}
