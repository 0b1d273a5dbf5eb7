//! Legal-palette color tools for the in-game design editor.
//!
//! The editor's color picker is a fixed grid of hue, saturation and value
//! steps, so every selectable color is enumerable. This crate enumerates
//! that grid under both historical channel-range conventions, maps between
//! its HSV and RGB forms, finds the nearest legal color to an arbitrary RGB
//! value, and reduces whole images to the editor's 15 colors by clustering
//! and snapping.
//!
//! ```no_run
//! use acnh_quant::{CanvasOptions, LegalPalette, RangeConvention, quantize_to_canvas};
//!
//! # fn main() -> anyhow::Result<()> {
//! let palette = LegalPalette::generate(RangeConvention::Standard360);
//! let img = image::open("photo.png")?;
//! let quantized = quantize_to_canvas(&img, &palette, CanvasOptions::default())?;
//! quantized.to_image().save("design.png")?;
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod error;
pub mod nearest;
pub mod palette;
pub mod quantize;

pub use crate::color::{HsvColor, RgbColor, hsv_to_rgb};
pub use crate::error::QuantizeError;
pub use crate::nearest::nearest_color;
pub use crate::palette::{LegalPalette, PaletteIndex, RangeConvention};
pub use crate::quantize::{
    CANVAS_SIZE, CanvasOptions, PALETTE_SLOTS, QuantizedImage, ResizeFilter, quantize_image,
    quantize_pixels, quantize_to_canvas,
};
