// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera pipeline
//!
//! Errors that decide whether any visible output exists (acquisition, capture)
//! are returned to the caller. Failures of optional enhancements and of
//! teardown never become errors: those paths report a [`BestEffort`] outcome.

use crate::backends::camera::types::{PlatformError, PlatformErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Stream session error: {0}")]
    Session(#[from] SessionError),
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("LUT error: {0}")]
    Lut(#[from] LutLoadError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Camera acquisition failure, classified from the platform-reported cause
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The user or a policy refused camera access
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    /// No camera exists that can serve the request
    #[error("No camera device available: {0}")]
    NoDevice(String),
    /// Anything else, including a camera held by another process
    #[error("Camera acquisition failed: {0}")]
    Other(String),
}

impl From<&PlatformError> for AcquisitionError {
    fn from(err: &PlatformError) -> Self {
        let msg = err.message.clone();
        match err.kind {
            PlatformErrorKind::NotAllowed | PlatformErrorKind::Security => {
                AcquisitionError::PermissionDenied(msg)
            }
            PlatformErrorKind::NotFound | PlatformErrorKind::Overconstrained => {
                AcquisitionError::NoDevice(msg)
            }
            PlatformErrorKind::NotReadable
            | PlatformErrorKind::Abort
            | PlatformErrorKind::Unknown => AcquisitionError::Other(msg),
        }
    }
}

impl From<PlatformError> for AcquisitionError {
    fn from(err: PlatformError) -> Self {
        AcquisitionError::from(&err)
    }
}

/// Failure of `StreamSession::start`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    /// The video sink never reported readable dimensions
    #[error("Video source not readable after {0:?}")]
    ReadinessTimeout(Duration),
    /// `stop` was called while the start was in flight
    #[error("Start cancelled by stop")]
    Cancelled,
}

/// Still capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The drawing surface has not been sized yet
    #[error("Drawing surface not ready ({width}x{height})")]
    NotReady { width: u32, height: u32 },
    /// The encoder failed or produced no bytes
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Colour LUT loading errors
///
/// A failed load always leaves the LUT in its identity state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LutLoadError {
    #[error("Invalid LUT size {0} (expected 1..=256)")]
    InvalidSize(u32),
    #[error("Failed to fetch LUT resource: {0}")]
    Fetch(String),
    #[error("Failed to decode LUT image: {0}")]
    Decode(String),
    #[error("LUT image holds {actual} bytes, a cube of this size needs {expected}")]
    TooSmall { expected: usize, actual: usize },
}

/// Object URL registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// The handle was never minted or has already been revoked
    #[error("Unknown or revoked object URL: {0}")]
    UnknownUrl(String),
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory on this system")]
    NoConfigDir,
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a best-effort operation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The session has no active track
    NotReady,
    /// The track reports no capability for this control
    Unsupported,
    /// The requested value is already in effect
    Unchanged,
    /// Nothing left to release
    AlreadyStopped,
}

/// Outcome of an operation whose failure is intentionally absorbed
///
/// Exposure and focus control, track release and handle release report
/// through this type instead of `Result`: callers may inspect it, but there
/// is no error to propagate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    /// The change reached the hardware or the resource was released
    Applied,
    /// Nothing was attempted
    Skipped(SkipReason),
    /// The attempt failed and the failure was absorbed
    Ignored(String),
}

impl BestEffort {
    pub fn is_applied(&self) -> bool {
        matches!(self, BestEffort::Applied)
    }
}
