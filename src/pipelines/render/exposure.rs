// SPDX-License-Identifier: GPL-3.0-only

//! Exposure simulation
//!
//! Brightening is faked with a uniform white overlay of opacity
//! `(2^EV - 1) × 0.15`. Negative EV gives a negative opacity, which is
//! rendered as a black overlay of the same magnitude.

use crate::constants::exposure::{MAX_EV, MIN_EV, OVERLAY_GAIN};

/// Clamp an EV into the supported range; NaN reads as 0
pub fn clamp_ev(ev: f32) -> f32 {
    if ev.is_nan() {
        return 0.0;
    }
    ev.clamp(MIN_EV, MAX_EV)
}

/// Signed overlay opacity for `ev` (positive = white, negative = black)
pub fn overlay_opacity(ev: f32) -> f32 {
    (2f32.powf(clamp_ev(ev)) - 1.0) * OVERLAY_GAIN
}

/// A solid colour composited source-over onto every pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureOverlay {
    color: u8,
    alpha: f32,
}

impl ExposureOverlay {
    /// Overlay for `ev`, or `None` when there is nothing to blend
    pub fn for_ev(ev: f32) -> Option<Self> {
        let opacity = overlay_opacity(ev);
        if opacity == 0.0 {
            return None;
        }
        Some(Self {
            color: if opacity > 0.0 { 255 } else { 0 },
            alpha: opacity.abs().min(1.0),
        })
    }

    /// Overlay colour level (255 white, 0 black)
    pub fn color(&self) -> u8 {
        self.color
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Blend onto RGBA pixels in place
    pub fn apply(&self, pixels: &mut [u8]) {
        let src = self.color as f32 * self.alpha;
        let keep = 1.0 - self.alpha;
        let color_lut: [u8; 256] =
            std::array::from_fn(|v| (src + v as f32 * keep).round().min(255.0) as u8);
        let alpha_lut: [u8; 256] =
            std::array::from_fn(|v| (255.0 * self.alpha + v as f32 * keep).round().min(255.0) as u8);

        for px in pixels.chunks_exact_mut(4) {
            px[0] = color_lut[px[0] as usize];
            px[1] = color_lut[px[1] as usize];
            px[2] = color_lut[px[2] as usize];
            px[3] = alpha_lut[px[3] as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_ev(10.0), 2.0);
        assert_eq!(clamp_ev(-100.0), -2.0);
        assert_eq!(clamp_ev(f32::NAN), 0.0);
        assert_eq!(clamp_ev(0.5), 0.5);
    }

    #[test]
    fn test_zero_ev_has_no_overlay() {
        assert!(ExposureOverlay::for_ev(0.0).is_none());
    }

    #[test]
    fn test_positive_ev_whitens() {
        let overlay = ExposureOverlay::for_ev(1.0).unwrap();
        assert_eq!(overlay.color(), 255);
        assert!((overlay.alpha() - 0.15).abs() < 1e-6);

        let mut px = [100, 0, 255, 255];
        overlay.apply(&mut px);
        // 255 * 0.15 + v * 0.85
        assert_eq!(px, [123, 38, 255, 255]);
    }

    #[test]
    fn test_negative_ev_darkens() {
        let overlay = ExposureOverlay::for_ev(-1.0).unwrap();
        assert_eq!(overlay.color(), 0);
        assert!((overlay.alpha() - 0.075).abs() < 1e-6);

        let mut px = [200, 0, 40, 255];
        overlay.apply(&mut px);
        assert_eq!(px, [185, 0, 37, 255]);
    }
}
