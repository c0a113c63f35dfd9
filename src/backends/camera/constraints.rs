// SPDX-License-Identifier: GPL-3.0-only

//! Stream request construction
//!
//! Cameras vary wildly in what they can deliver, and a request the hardware
//! cannot meet fails outright instead of degrading. Every video value is
//! therefore phrased as an ideal, so the host picks its nearest supported
//! mode (or the other camera) rather than refusing to start.

use super::types::FacingMode;
use crate::constants::stream::{
    BASELINE_HEIGHT, BASELINE_WIDTH, IDEAL_FRAME_RATE, MAX_FRAME_RATE,
};
use serde::{Deserialize, Serialize};

/// A single constrained value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constrain<T> {
    /// Preferred value; the host may substitute the closest it supports
    Ideal(T),
    /// Hard requirement; the host fails acquisition if it cannot comply
    Exact(T),
}

impl<T: Copy> Constrain<T> {
    pub fn value(&self) -> T {
        match self {
            Constrain::Ideal(v) | Constrain::Exact(v) => *v,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Constrain::Exact(_))
    }
}

/// Frame rate preference with a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRateConstraint {
    pub ideal: u32,
    pub max: u32,
}

/// Noise reduction hint levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseReduction {
    Off,
    Fast,
    HighQuality,
}

/// Optional device hints, dropped silently by hosts that do not know them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvancedHint {
    NoiseReduction(NoiseReduction),
}

/// Video part of a stream request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub facing_mode: Constrain<FacingMode>,
    pub width: Constrain<u32>,
    pub height: Constrain<u32>,
    pub frame_rate: FrameRateConstraint,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub advanced: Vec<AdvancedHint>,
}

/// Complete stream request
///
/// Built fresh for every start attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub audio: bool,
    pub video: VideoConstraints,
}

impl ConstraintSpec {
    /// True if any video value is a hard requirement
    pub fn has_exact_video(&self) -> bool {
        let v = &self.video;
        v.facing_mode.is_exact() || v.width.is_exact() || v.height.is_exact()
    }
}

/// Builds compatibility-first stream requests
pub struct ConstraintProfile;

impl ConstraintProfile {
    /// Build the request for a camera facing `facing`
    ///
    /// Pure and total: the baseline is 1280x720 at an ideal 30 fps capped at
    /// 30, no audio, and a noise-reduction hint hosts are free to ignore.
    pub fn build(facing: FacingMode) -> ConstraintSpec {
        ConstraintSpec {
            audio: false,
            video: VideoConstraints {
                facing_mode: Constrain::Ideal(facing),
                width: Constrain::Ideal(BASELINE_WIDTH),
                height: Constrain::Ideal(BASELINE_HEIGHT),
                frame_rate: FrameRateConstraint {
                    ideal: IDEAL_FRAME_RATE,
                    max: MAX_FRAME_RATE,
                },
                advanced: vec![AdvancedHint::NoiseReduction(NoiseReduction::Fast)],
            },
        }
    }
}
