// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Which way the requested camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user (selfie)
    User,
    /// Back camera, facing away from the user
    #[default]
    Environment,
}

impl FacingMode {
    /// The camera on the other side of the device
    pub fn opposite(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "front" | "selfie" => Ok(FacingMode::User),
            "environment" | "back" | "rear" => Ok(FacingMode::Environment),
            other => Err(format!("unknown facing mode '{}'", other)),
        }
    }
}

/// Pixel dimensions of a video source or drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (nothing can be drawn or captured)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of an RGBA buffer with these dimensions
    pub fn rgba_len(&self) -> usize {
        self.pixel_count() * 4
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single decoded video frame in tightly packed RGBA
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// When the sink produced the frame
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap an RGBA buffer, rejecting buffers that do not match the dimensions
    pub fn from_rgba(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Option<Self> {
        let data = data.into();
        if data.len() != Dimensions::new(width, height).rgba_len() {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
            captured_at: Instant::now(),
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Numeric range reported by a track capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaRange {
    pub min: f64,
    pub max: f64,
    pub step: Option<f64>,
}

impl MediaRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: None,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Map `normalized` in `[0, 1]` linearly onto the range
    pub fn lerp(&self, normalized: f64) -> f64 {
        let t = normalized.clamp(0.0, 1.0);
        self.min + t * (self.max - self.min)
    }
}

/// Focus modes a track may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusMode {
    None,
    Manual,
    SingleShot,
    Continuous,
}

/// Typed answer to "what can this track do"
///
/// Optional controls are absent rather than zero-filled, so callers branch on
/// `Option` instead of probing for missing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackCapabilities {
    pub exposure_compensation: Option<MediaRange>,
    pub focus_distance: Option<MediaRange>,
    pub focus_modes: Vec<FocusMode>,
}

impl TrackCapabilities {
    /// Exposure-compensation range, if the track exposes one
    pub fn exposure_compensation(&self) -> Option<MediaRange> {
        self.exposure_compensation
    }

    /// Focus-distance range, only when manual focus is also supported
    pub fn manual_focus(&self) -> Option<MediaRange> {
        if !self.focus_modes.contains(&FocusMode::Manual) {
            return None;
        }
        self.focus_distance
    }
}

/// Values currently in effect on a track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub facing_mode: Option<FacingMode>,
    pub exposure_compensation: Option<f64>,
    pub focus_mode: Option<FocusMode>,
    pub focus_distance: Option<f64>,
}

/// Control changes requested on a running track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_compensation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_mode: Option<FocusMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_distance: Option<f64>,
}

/// Host error categories, named after the errors a media host reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformErrorKind {
    /// User or policy denied access
    NotAllowed,
    /// Insecure context or blocked by security policy
    Security,
    /// No matching device
    NotFound,
    /// No device satisfies a required constraint
    Overconstrained,
    /// Device exists but cannot be opened (usually busy)
    NotReadable,
    /// Operation interrupted
    Abort,
    Unknown,
}

impl PlatformErrorKind {
    /// Parse a host error name such as `NotAllowedError`
    pub fn from_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::NotAllowed,
            "SecurityError" => Self::Security,
            "NotFoundError" | "DevicesNotFoundError" => Self::NotFound,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => Self::Overconstrained,
            "NotReadableError" | "TrackStartError" => Self::NotReadable,
            "AbortError" => Self::Abort,
            _ => Self::Unknown,
        }
    }
}

/// Error reported by the media host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build from a host error name and message
    pub fn from_name(name: &str, message: impl Into<String>) -> Self {
        Self::new(PlatformErrorKind::from_name(name), message)
    }
}
