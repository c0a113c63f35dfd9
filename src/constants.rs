// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Baseline stream request
///
/// Every value here is requested as an ideal, never as an exact requirement,
/// so cameras that cannot meet it still start with their nearest mode.
pub mod stream {
    /// Ideal capture width in pixels
    pub const BASELINE_WIDTH: u32 = 1280;
    /// Ideal capture height in pixels
    pub const BASELINE_HEIGHT: u32 = 720;
    /// Ideal frame rate
    pub const IDEAL_FRAME_RATE: u32 = 30;
    /// Frame rate ceiling
    pub const MAX_FRAME_RATE: u32 = 30;
}

/// Exposure simulation
pub mod exposure {
    /// Lowest EV the frame processor accepts
    pub const MIN_EV: f32 = -2.0;
    /// Highest EV the frame processor accepts
    pub const MAX_EV: f32 = 2.0;
    /// Overlay opacity per unit of `2^EV - 1`
    pub const OVERLAY_GAIN: f32 = 0.15;
}

/// Tonal filter coefficients
pub mod filters {
    /// ITU-R BT.709 luma weights (R, G, B)
    pub const LUMA_BT709: [f32; 3] = [0.2126, 0.7152, 0.0722];
    /// Channel gain that a colour-temperature filter boosts by
    pub const TEMPERATURE_BOOST: f32 = 1.05;
    /// Channel gain that a colour-temperature filter cuts by
    pub const TEMPERATURE_CUT: f32 = 0.95;
}

/// Still capture defaults
pub mod capture {
    /// Default lossy encoding quality in `[0, 1]`
    pub const DEFAULT_QUALITY: f32 = 0.92;
}

/// Colour lookup tables
pub mod lut {
    /// Largest cube edge accepted (one bucket per 8-bit level)
    pub const MAX_SIZE: u32 = 256;
    /// Cube edge used when no size is configured
    pub const DEFAULT_SIZE: u32 = 32;
}

/// How long `StreamSession::start` waits for the video sink to report dimensions
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Display refresh rate the render loop is driven at when no host clock is available
pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

/// Scheme prefix for gallery reference handles
pub const OBJECT_URL_PREFIX: &str = "blob:camera-pipeline/";
