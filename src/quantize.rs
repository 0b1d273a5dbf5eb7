//! Reduction of an image to legal colors.
//!
//! Quantization is two-stage: cluster the image's pixels down to
//! [`PALETTE_SLOTS`] representative colors, then snap each representative to
//! the nearest legal color. Snapping runs once per cluster, so the per-pixel
//! work after clustering is a table lookup.

use std::collections::HashSet;

use image::{DynamicImage, RgbImage, RgbaImage, imageops::FilterType};
use kmeans_colors::get_kmeans;
use log::debug;
use palette::Srgb;

use crate::color::{HsvColor, RgbColor, hsv_to_rgb};
use crate::error::QuantizeError;
use crate::nearest::nearest_color;
use crate::palette::{LegalPalette, RangeConvention};

/// Colors available in one design.
pub const PALETTE_SLOTS: usize = 15;

/// Edge length of the design canvas, in pixels.
pub const CANVAS_SIZE: u32 = 32;

const KMEANS_MAX_ITER: usize = 20;
const KMEANS_CONVERGE: f32 = 1e-4;

/// Seed used whenever a run must be reproducible.
const DETERMINISTIC_SEED: u64 = 0;

/// Resampling filter for the canvas resize.
///
/// Box and Hamming have no exact kernel in the backend resizer and use the
/// triangle kernel instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    Nearest,
    Box,
    Bilinear,
    Hamming,
    Bicubic,
    #[default]
    Lanczos,
}

impl ResizeFilter {
    fn backend(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Box | ResizeFilter::Bilinear | ResizeFilter::Hamming => {
                FilterType::Triangle
            }
            ResizeFilter::Bicubic => FilterType::CatmullRom,
            ResizeFilter::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Options for the canvas flow.
#[derive(Debug, Clone, Copy)]
pub struct CanvasOptions {
    /// Use the fixed clustering seed so reruns are byte-identical.
    pub deterministic: bool,
    /// Quantize at full resolution before the resize.
    pub prequantize: bool,
    /// Resampling filter for the resize.
    pub filter: ResizeFilter,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        CanvasOptions {
            deterministic: true,
            prequantize: false,
            filter: ResizeFilter::default(),
        }
    }
}

/// Result of a quantization pass: the input shape with every pixel rewritten
/// to a legal HSV value. The alpha column, when present, is the input's,
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    width: u32,
    height: u32,
    channels: u32,
    convention: RangeConvention,
    data: Vec<f64>,
}

impl QuantizedImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel, 3 or 4.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn convention(&self) -> RangeConvention {
        self.convention
    }

    /// Row-major HSV (plus alpha when present) values.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The distinct HSV colors of the output, sorted by channel triple.
    pub fn distinct_colors(&self) -> Vec<HsvColor> {
        let stride = self.channels as usize;
        let mut seen = HashSet::new();
        let mut colors = Vec::new();
        for pixel in self.data.chunks_exact(stride) {
            let bits = [pixel[0].to_bits(), pixel[1].to_bits(), pixel[2].to_bits()];
            if seen.insert(bits) {
                colors.push(HsvColor::new(pixel[0], pixel[1], pixel[2]));
            }
        }
        colors.sort_by(|a, b| {
            a.hue
                .total_cmp(&b.hue)
                .then(a.sat.total_cmp(&b.sat))
                .then(a.val.total_cmp(&b.val))
        });
        colors
    }

    /// Render back to an image, converting each pixel's HSV to RGB bytes.
    pub fn to_image(&self) -> DynamicImage {
        let stride = self.channels as usize;
        let channel_max = self.convention.channel_max();
        let mut raw = Vec::with_capacity(self.width as usize * self.height as usize * stride);
        for pixel in self.data.chunks_exact(stride) {
            let rgb = hsv_to_rgb(HsvColor::new(pixel[0], pixel[1], pixel[2]), channel_max);
            raw.extend_from_slice(&rgb.rounded());
            if stride == 4 {
                raw.push(pixel[3].round() as u8);
            }
        }

        if stride == 4 {
            DynamicImage::ImageRgba8(
                RgbaImage::from_raw(self.width, self.height, raw)
                    .expect("quantized buffer length matches its shape"),
            )
        } else {
            DynamicImage::ImageRgb8(
                RgbImage::from_raw(self.width, self.height, raw)
                    .expect("quantized buffer length matches its shape"),
            )
        }
    }
}

/// Run the clustering collaborator over 0-1 RGB points.
fn cluster_pixels(points: &[Srgb<f32>], seed: u64) -> (Vec<Srgb<f32>>, Vec<u8>) {
    let result = get_kmeans(
        PALETTE_SLOTS,
        KMEANS_MAX_ITER,
        KMEANS_CONVERGE,
        false,
        points,
        seed,
    );
    debug!(
        "clustered {} pixels into {} colors, seed {seed}, score {}",
        points.len(),
        result.centroids.len(),
        result.score
    );
    (result.centroids, result.indices)
}

/// Quantize a flat pixel buffer down to legal colors.
///
/// `data` is row-major, `width * height * channels` long, with `channels`
/// 3 or 4 and color channels in 0-255. Every pixel's RGB joins the
/// clustering; the alpha column, when present, is copied through unchanged
/// and never enters the color math.
///
/// Steps performed:
/// 1. Cluster all pixels to [`PALETTE_SLOTS`] representative colors, seeded
///    for reproducibility when `deterministic` is set.
/// 2. Snap each representative to the nearest legal RGB value, then to the
///    HSV grid point behind it.
/// 3. Rewrite every pixel with its cluster's snapped HSV.
///
/// The output holds at most [`PALETTE_SLOTS`] distinct colors (fewer when
/// clusters snap to the same legal color), each a member of `palette`.
pub fn quantize_pixels(
    data: &[f64],
    width: u32,
    height: u32,
    channels: u32,
    palette: &LegalPalette,
    deterministic: bool,
) -> Result<QuantizedImage, QuantizeError> {
    let stride = channels as usize;
    let pixel_count = width as usize * height as usize;
    if !(3..=4).contains(&channels) || pixel_count == 0 || data.len() != pixel_count * stride {
        return Err(QuantizeError::InvalidImageShape {
            width,
            height,
            channels,
            len: data.len(),
        });
    }

    // 1. Cluster in RGB space.
    let points: Vec<Srgb<f32>> = data
        .chunks_exact(stride)
        .map(|pixel| {
            Srgb::new(
                (pixel[0] / 255.0) as f32,
                (pixel[1] / 255.0) as f32,
                (pixel[2] / 255.0) as f32,
            )
        })
        .collect();
    let seed = if deterministic {
        DETERMINISTIC_SEED
    } else {
        rand::random::<u64>()
    };
    let (centroids, indices) = cluster_pixels(&points, seed);

    // 2. Snap each centroid to the legal grid.
    let mut snapped = Vec::with_capacity(centroids.len());
    for centroid in &centroids {
        let rgb = RgbColor::new(
            f64::from(centroid.red) * 255.0,
            f64::from(centroid.green) * 255.0,
            f64::from(centroid.blue) * 255.0,
        );
        let legal_rgb = nearest_color(&rgb, palette.rgb_colors())?;
        let legal_hsv = palette
            .hsv_for_rgb(legal_rgb)
            .copied()
            .expect("every legal rgb has a grid point");
        snapped.push(legal_hsv);
    }
    let distinct = snapped
        .iter()
        .map(|c| [c.hue.to_bits(), c.sat.to_bits(), c.val.to_bits()])
        .collect::<HashSet<_>>()
        .len();
    debug!(
        "snapped {} centroids onto {distinct} distinct legal colors",
        snapped.len()
    );

    // 3. Rewrite pixels with their cluster's snapped color.
    let mut out = Vec::with_capacity(data.len());
    for (pixel, &cluster) in data.chunks_exact(stride).zip(indices.iter()) {
        let hsv = snapped[cluster as usize];
        out.push(hsv.hue);
        out.push(hsv.sat);
        out.push(hsv.val);
        if stride == 4 {
            out.push(pixel[3]);
        }
    }

    Ok(QuantizedImage {
        width,
        height,
        channels,
        convention: palette.convention(),
        data: out,
    })
}

/// Quantize a decoded image at its native size.
///
/// Images carrying an alpha channel quantize as RGBA with alpha passed
/// through; everything else is treated as RGB.
pub fn quantize_image(
    img: &DynamicImage,
    palette: &LegalPalette,
    deterministic: bool,
) -> Result<QuantizedImage, QuantizeError> {
    let (width, height) = (img.width(), img.height());
    if img.color().has_alpha() {
        let data: Vec<f64> = img.to_rgba8().into_raw().iter().map(|&b| f64::from(b)).collect();
        quantize_pixels(&data, width, height, 4, palette, deterministic)
    } else {
        let data: Vec<f64> = img.to_rgb8().into_raw().iter().map(|&b| f64::from(b)).collect();
        quantize_pixels(&data, width, height, 3, palette, deterministic)
    }
}

/// Quantize an image for the design canvas.
///
/// The image is resized to [`CANVAS_SIZE`]x[`CANVAS_SIZE`] with the chosen
/// filter and quantized. With [`CanvasOptions::prequantize`] set, a
/// full-resolution quantize pass runs first, so the resize samples
/// already-legal colors and the canvas pass reduces whatever the filter
/// blended.
pub fn quantize_to_canvas(
    img: &DynamicImage,
    palette: &LegalPalette,
    opts: CanvasOptions,
) -> Result<QuantizedImage, QuantizeError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(QuantizeError::InvalidImageShape {
            width: img.width(),
            height: img.height(),
            channels: if img.color().has_alpha() { 4 } else { 3 },
            len: 0,
        });
    }

    let source = if opts.prequantize {
        debug!(
            "prequantize pass at {}x{} before canvas resize",
            img.width(),
            img.height()
        );
        quantize_image(img, palette, opts.deterministic)?.to_image()
    } else {
        img.clone()
    };

    let resized = if source.color().has_alpha() {
        DynamicImage::ImageRgba8(image::imageops::resize(
            &source.to_rgba8(),
            CANVAS_SIZE,
            CANVAS_SIZE,
            opts.filter.backend(),
        ))
    } else {
        DynamicImage::ImageRgb8(image::imageops::resize(
            &source.to_rgb8(),
            CANVAS_SIZE,
            CANVAS_SIZE,
            opts.filter.backend(),
        ))
    };

    quantize_image(&resized, palette, opts.deterministic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_palette() -> LegalPalette {
        LegalPalette::generate(RangeConvention::Standard360)
    }

    fn solid_rgb(width: u32, height: u32, rgb: [f64; 3]) -> Vec<f64> {
        let mut data = Vec::new();
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        data
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        let palette = standard_palette();
        let data = vec![0.0; 8];
        let err = quantize_pixels(&data, 2, 2, 2, &palette, true).unwrap_err();
        assert_eq!(
            err,
            QuantizeError::InvalidImageShape {
                width: 2,
                height: 2,
                channels: 2,
                len: 8,
            }
        );
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let palette = standard_palette();
        let data = vec![0.0; 13];
        assert!(matches!(
            quantize_pixels(&data, 2, 2, 3, &palette, true),
            Err(QuantizeError::InvalidImageShape { len: 13, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_image() {
        let palette = standard_palette();
        assert!(matches!(
            quantize_pixels(&[], 0, 4, 3, &palette, true),
            Err(QuantizeError::InvalidImageShape { .. })
        ));
    }

    #[test]
    fn test_solid_legal_color_is_a_fixed_point() {
        let palette = standard_palette();
        // (255, 0, 0) is exactly the grid point hue 0, sat 100, val 100.
        let data = solid_rgb(4, 4, [255.0, 0.0, 0.0]);
        let quantized = quantize_pixels(&data, 4, 4, 3, &palette, true).unwrap();

        let expected = HsvColor::new(0.0, 100.0, 100.0);
        assert_eq!(quantized.distinct_colors(), vec![expected]);
        for pixel in quantized.data().chunks_exact(3) {
            assert_eq!(pixel, &[0.0, 100.0, 100.0]);
        }
    }

    #[test]
    fn test_deterministic_runs_are_byte_identical() {
        let palette = standard_palette();
        let mut data = Vec::new();
        for i in 0..64u32 {
            data.extend_from_slice(&[
                f64::from(i * 4 % 256),
                f64::from(i * 7 % 256),
                f64::from(255 - i * 3 % 256),
            ]);
        }

        let first = quantize_pixels(&data, 8, 8, 3, &palette, true).unwrap();
        let second = quantize_pixels(&data, 8, 8, 3, &palette, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_colors_are_few_and_legal() {
        let palette = standard_palette();
        let mut data = Vec::new();
        for y in 0..8u32 {
            for x in 0..8u32 {
                data.extend_from_slice(&[
                    f64::from(x * 36),
                    f64::from(y * 36),
                    f64::from(255 - x * 20),
                ]);
            }
        }

        let quantized = quantize_pixels(&data, 8, 8, 3, &palette, true).unwrap();
        let colors = quantized.distinct_colors();
        assert!(colors.len() <= PALETTE_SLOTS);
        for color in &colors {
            assert!(
                palette.rgb_for_hsv(color).is_some(),
                "{color:?} is not a legal grid point"
            );
        }
    }

    #[test]
    fn test_alpha_passes_through_unchanged() {
        let palette = standard_palette();
        let alphas = [0.0, 64.0, 128.0, 255.0];
        let mut data = Vec::new();
        for (i, &alpha) in alphas.iter().enumerate() {
            let level = f64::from(i as u32) * 60.0;
            data.extend_from_slice(&[level, 255.0 - level, level / 2.0, alpha]);
        }

        let quantized = quantize_pixels(&data, 2, 2, 4, &palette, true).unwrap();
        let out_alphas: Vec<f64> = quantized
            .data()
            .chunks_exact(4)
            .map(|pixel| pixel[3])
            .collect();
        assert_eq!(out_alphas, alphas);
    }

    #[test]
    fn test_gray_input_stays_near_gray() {
        let palette = standard_palette();
        let mut data = Vec::new();
        for i in 0..64u32 {
            let level = 80.0 + f64::from(i) * 140.0 / 63.0;
            data.extend_from_slice(&[level, level, level]);
        }

        let quantized = quantize_pixels(&data, 8, 8, 3, &palette, true).unwrap();
        for color in quantized.distinct_colors() {
            let index = palette.index_of(color);
            assert!(
                index.sat <= 3,
                "gray input produced saturated color {color:?} (sat index {})",
                index.sat
            );
        }
    }

    #[test]
    fn test_distinct_colors_are_sorted() {
        let palette = standard_palette();
        let mut data = Vec::new();
        for i in 0..64u32 {
            data.extend_from_slice(&[
                f64::from(i * 4 % 256),
                f64::from(255 - i * 2 % 256),
                f64::from(i * 11 % 256),
            ]);
        }

        let quantized = quantize_pixels(&data, 8, 8, 3, &palette, true).unwrap();
        let colors = quantized.distinct_colors();
        for pair in colors.windows(2) {
            let a = (pair[0].hue, pair[0].sat, pair[0].val);
            let b = (pair[1].hue, pair[1].sat, pair[1].val);
            assert!(a < b, "{a:?} !< {b:?}");
        }
    }

    #[test]
    fn test_filter_backend_mapping() {
        assert!(matches!(ResizeFilter::Nearest.backend(), FilterType::Nearest));
        assert!(matches!(ResizeFilter::Box.backend(), FilterType::Triangle));
        assert!(matches!(ResizeFilter::Bilinear.backend(), FilterType::Triangle));
        assert!(matches!(ResizeFilter::Hamming.backend(), FilterType::Triangle));
        assert!(matches!(ResizeFilter::Bicubic.backend(), FilterType::CatmullRom));
        assert!(matches!(ResizeFilter::Lanczos.backend(), FilterType::Lanczos3));
    }
}
