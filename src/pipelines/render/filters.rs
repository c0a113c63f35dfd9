// SPDX-License-Identifier: GPL-3.0-only

//! Tonal filters applied as the last pass of a render step
//!
//! Exactly one filter is active per frame. Every pass walks the RGBA buffer
//! once and leaves alpha alone.

use crate::constants::filters::{LUMA_BT709, TEMPERATURE_BOOST, TEMPERATURE_CUT};
use crate::media::ColorLut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Filter selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// No pass at all
    #[default]
    Identity,
    /// BT.709 luma copied into all three channels
    Grayscale,
    /// Red boosted, blue cut
    Warm,
    /// Blue boosted, red cut
    Cool,
    /// Remap through the loaded color LUT
    Lut,
}

/// Name that does not match any filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown filter '{0}'")]
pub struct UnknownFilter(pub String);

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::Identity,
        FilterType::Grayscale,
        FilterType::Warm,
        FilterType::Cool,
        FilterType::Lut,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            FilterType::Identity => "identity",
            FilterType::Grayscale => "grayscale",
            FilterType::Warm => "warm",
            FilterType::Cool => "cool",
            FilterType::Lut => "lut",
        }
    }

    /// Label for pickers
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterType::Identity => "Original",
            FilterType::Grayscale => "Mono",
            FilterType::Warm => "Warm",
            FilterType::Cool => "Cool",
            FilterType::Lut => "LUT",
        }
    }

    /// Run this filter over RGBA pixels in place
    pub fn apply(&self, pixels: &mut [u8], lut: &ColorLut) {
        match self {
            FilterType::Identity => {}
            FilterType::Grayscale => grayscale(pixels),
            FilterType::Warm => scale_red_blue(pixels, TEMPERATURE_BOOST, TEMPERATURE_CUT),
            FilterType::Cool => scale_red_blue(pixels, TEMPERATURE_CUT, TEMPERATURE_BOOST),
            FilterType::Lut => lut.apply(pixels),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "none" | "original" | "standard" => Ok(FilterType::Identity),
            "grayscale" | "greyscale" | "mono" => Ok(FilterType::Grayscale),
            "warm" => Ok(FilterType::Warm),
            "cool" => Ok(FilterType::Cool),
            "lut" => Ok(FilterType::Lut),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

fn grayscale(pixels: &mut [u8]) {
    let [wr, wg, wb] = LUMA_BT709;
    for px in pixels.chunks_exact_mut(4) {
        let luma = (wr * px[0] as f32 + wg * px[1] as f32 + wb * px[2] as f32)
            .round()
            .min(255.0) as u8;
        px[0] = luma;
        px[1] = luma;
        px[2] = luma;
    }
}

/// Per-level gain table, rounded and capped at 255
fn gain_table(gain: f32) -> [u8; 256] {
    std::array::from_fn(|v| (v as f32 * gain).round().min(255.0) as u8)
}

fn scale_red_blue(pixels: &mut [u8], red_gain: f32, blue_gain: f32) {
    let red = gain_table(red_gain);
    let blue = gain_table(blue_gain);
    for px in pixels.chunks_exact_mut(4) {
        px[0] = red[px[0] as usize];
        px[2] = blue[px[2] as usize];
    }
}
