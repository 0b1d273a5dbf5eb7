//! Legal color enumeration and picker index math.
//!
//! The editor's color picker is a fixed grid: a row of hues and 15-step
//! sliders for saturation and value. Everything selectable is enumerable, so
//! the palette is generated once per convention and then treated as
//! immutable lookup data.
//!
//! Two encodings of the grid exist in the wild and are kept as explicit
//! configuration rather than baked-in constants: the symmetric 0-255
//! encoding used by older exports and the 0-360/0-100 encoding the picker
//! displays. Step sizes derive from the convention, never from module
//! statics.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::color::{HsvColor, RgbColor, hsv_to_rgb};
use crate::error::QuantizeError;

/// Channel range convention of the picker grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeConvention {
    /// Hue, saturation and value all encoded over 0-255, with 29 hue grid
    /// points (a 30th would wrap onto hue zero).
    Legacy255,
    /// Hue over 0-360 in steps of 12 (30 grid points), saturation and value
    /// over 0-100.
    Standard360,
}

impl RangeConvention {
    /// Number of hue grid points.
    pub fn hue_steps(self) -> u32 {
        match self {
            RangeConvention::Legacy255 => 29,
            RangeConvention::Standard360 => 30,
        }
    }

    /// Number of saturation and value grid points, endpoints included.
    pub fn sat_val_steps(self) -> u32 {
        15
    }

    /// Upper bound of the hue channel.
    pub fn hue_range(self) -> f64 {
        match self {
            RangeConvention::Legacy255 => 255.0,
            RangeConvention::Standard360 => 360.0,
        }
    }

    /// Upper bound of the saturation and value channels.
    pub fn sat_val_range(self) -> f64 {
        match self {
            RangeConvention::Legacy255 => 255.0,
            RangeConvention::Standard360 => 100.0,
        }
    }

    /// Distance between adjacent hue grid points.
    pub fn hue_step(self) -> f64 {
        self.hue_range() / f64::from(self.hue_steps())
    }

    /// Distance between adjacent saturation or value grid points.
    pub fn sat_val_step(self) -> f64 {
        self.sat_val_range() / f64::from(self.sat_val_steps() - 1)
    }

    /// Channel maxima in `[hue, sat, val]` order, as the color converter
    /// expects them.
    pub fn channel_max(self) -> [f64; 3] {
        [self.hue_range(), self.sat_val_range(), self.sat_val_range()]
    }
}

impl fmt::Display for RangeConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeConvention::Legacy255 => f.write_str("legacy-255"),
            RangeConvention::Standard360 => f.write_str("standard-360"),
        }
    }
}

impl FromStr for RangeConvention {
    type Err = QuantizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "legacy-255" | "legacy" => Ok(RangeConvention::Legacy255),
            "standard-360" | "standard" => Ok(RangeConvention::Standard360),
            _ => Err(QuantizeError::UnsupportedConvention(s.to_string())),
        }
    }
}

/// 1-based grid coordinates of a color in the picker, the numbers a player
/// dials in by hand. Distinct from the raw channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteIndex {
    pub hue: u32,
    pub sat: u32,
    pub val: u32,
}

/// Fixed-point key for float channel triples.
///
/// Channels scale by 4096 and round, giving exact-match map semantics over
/// the floats the grid actually produces: distinct legal colors sit at least
/// 0.13 RGB units apart, so only bitwise-duplicate colors share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ChannelKey([u32; 3]);

const KEY_SCALE: f64 = 4096.0;

impl ChannelKey {
    fn new(a: f64, b: f64, c: f64) -> Self {
        ChannelKey([
            (a * KEY_SCALE).round() as u32,
            (b * KEY_SCALE).round() as u32,
            (c * KEY_SCALE).round() as u32,
        ])
    }
}

fn rgb_key(rgb: &RgbColor) -> ChannelKey {
    ChannelKey::new(rgb.red, rgb.green, rgb.blue)
}

fn hsv_key(hsv: &HsvColor) -> ChannelKey {
    ChannelKey::new(hsv.hue, hsv.sat, hsv.val)
}

/// Grid point `k` of `intervals` over `0..=range`. Computed as a single
/// product and division so repeated enumeration never drifts.
fn grid_point(range: f64, k: u32, intervals: u32) -> f64 {
    range * f64::from(k) / f64::from(intervals)
}

/// Every color selectable in the picker under one convention, with lookup
/// tables in both directions.
#[derive(Debug, Clone)]
pub struct LegalPalette {
    convention: RangeConvention,
    hsv_colors: Vec<HsvColor>,
    rgb_colors: Vec<RgbColor>,
    rgb_to_hsv: HashMap<ChannelKey, HsvColor>,
    hsv_to_rgb: HashMap<ChannelKey, RgbColor>,
}

impl LegalPalette {
    /// Enumerate the full picker grid for `convention`.
    ///
    /// Enumeration is hue-major, then saturation, then value. The RGB side
    /// collapses duplicates (every zero-value point is black, zero-saturation
    /// points of one value are one gray), keeping the first occurrence's
    /// position; the RGB to HSV table keeps the last writer, so a duplicated
    /// RGB maps to the final grid point that produced it.
    pub fn generate(convention: RangeConvention) -> Self {
        let channel_max = convention.channel_max();
        let hue_steps = convention.hue_steps();
        let sat_val_steps = convention.sat_val_steps();

        let mut hsv_colors = Vec::with_capacity((hue_steps * sat_val_steps * sat_val_steps) as usize);
        let mut rgb_colors = Vec::new();
        let mut rgb_to_hsv = HashMap::new();
        let mut hsv_to_rgb_map = HashMap::new();

        for h in 0..hue_steps {
            let hue = grid_point(convention.hue_range(), h, hue_steps);
            for s in 0..sat_val_steps {
                let sat = grid_point(convention.sat_val_range(), s, sat_val_steps - 1);
                for v in 0..sat_val_steps {
                    let val = grid_point(convention.sat_val_range(), v, sat_val_steps - 1);
                    let hsv = HsvColor::new(hue, sat, val);
                    let rgb = hsv_to_rgb(hsv, channel_max);

                    hsv_colors.push(hsv);
                    hsv_to_rgb_map.insert(hsv_key(&hsv), rgb);
                    if rgb_to_hsv.insert(rgb_key(&rgb), hsv).is_none() {
                        rgb_colors.push(rgb);
                    }
                }
            }
        }

        debug!(
            "generated {} palette: {} hsv grid points, {} unique rgb colors",
            convention,
            hsv_colors.len(),
            rgb_colors.len()
        );

        LegalPalette {
            convention,
            hsv_colors,
            rgb_colors,
            rgb_to_hsv,
            hsv_to_rgb: hsv_to_rgb_map,
        }
    }

    pub fn convention(&self) -> RangeConvention {
        self.convention
    }

    /// All grid points in enumeration order.
    pub fn hsv_colors(&self) -> &[HsvColor] {
        &self.hsv_colors
    }

    /// Legal RGB values, duplicates collapsed, first-occurrence order.
    pub fn rgb_colors(&self) -> &[RgbColor] {
        &self.rgb_colors
    }

    /// Number of distinct legal RGB colors.
    pub fn len(&self) -> usize {
        self.rgb_colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rgb_colors.is_empty()
    }

    /// HSV grid point for a legal RGB value, if `rgb` is exactly legal.
    pub fn hsv_for_rgb(&self, rgb: &RgbColor) -> Option<&HsvColor> {
        self.rgb_to_hsv.get(&rgb_key(rgb))
    }

    /// RGB value for a legal HSV grid point, if `hsv` is exactly on the grid.
    pub fn rgb_for_hsv(&self, hsv: &HsvColor) -> Option<&RgbColor> {
        self.hsv_to_rgb.get(&hsv_key(hsv))
    }

    /// Picker coordinates nearest to `hsv` under this palette's convention.
    ///
    /// Each channel divides by its step size, rounds half up, and shifts to
    /// 1-based. Hue does not wrap: a full-range hue reports the slot one
    /// past the grid rather than folding back onto slot one.
    pub fn index_of(&self, hsv: HsvColor) -> PaletteIndex {
        PaletteIndex {
            hue: (hsv.hue / self.convention.hue_step()).round() as u32 + 1,
            sat: (hsv.sat / self.convention.sat_val_step()).round() as u32 + 1,
            val: (hsv.val / self.convention.sat_val_step()).round() as u32 + 1,
        }
    }

    /// Like [`index_of`](Self::index_of) for channel values expressed
    /// against caller-supplied ranges; channels rescale onto the
    /// convention's ranges first.
    pub fn index_of_scaled(&self, hsv: HsvColor, ranges: [f64; 3]) -> PaletteIndex {
        let max = self.convention.channel_max();
        self.index_of(HsvColor::new(
            hsv.hue / ranges[0] * max[0],
            hsv.sat / ranges[1] * max[1],
            hsv.val / ranges[2] * max[2],
        ))
    }
}
