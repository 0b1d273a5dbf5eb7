//! HSV and RGB color types and the HSV to RGB transform.
//!
//! Channels stay `f64` end to end. Rounding to `u8` happens only at image
//! output, so palette lookups can rely on exact values.

/// HSV color. Channel ranges depend on the active convention, so the raw
/// numbers are meaningless without the channel maxima they were produced
/// under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvColor {
    pub hue: f64,
    pub sat: f64,
    pub val: f64,
}

impl HsvColor {
    pub fn new(hue: f64, sat: f64, val: f64) -> Self {
        Self { hue, sat, val }
    }
}

/// RGB color with channels in 0-255. Alpha never appears here; pixel buffers
/// carry it separately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl RgbColor {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Round each channel to the nearest integer, as `[r, g, b]` bytes.
    pub fn rounded(&self) -> [u8; 3] {
        [
            self.red.round() as u8,
            self.green.round() as u8,
            self.blue.round() as u8,
        ]
    }
}

/// Convert an HSV color to RGB.
///
/// `channel_max` gives the maximum of each input channel in order
/// `[hue, sat, val]`; every channel is normalized against its maximum before
/// the usual sector formula runs, so the same function serves both the
/// 0-255 and the 0-360/0-100 conventions. Output channels are 0-255 floats.
///
/// Saturation zero short-circuits to an exact gray (hue is ignored), and a
/// hue equal to its maximum lands in sector six, which wraps to sector zero:
/// full-range hue is the same color as hue zero.
pub fn hsv_to_rgb(hsv: HsvColor, channel_max: [f64; 3]) -> RgbColor {
    let h = hsv.hue / channel_max[0];
    let s = hsv.sat / channel_max[1];
    let v = hsv.val / channel_max[2];

    if s == 0.0 {
        let gray = v * 255.0;
        return RgbColor::new(gray, gray, gray);
    }

    let sector = h * 6.0;
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    RgbColor::new(r * 255.0, g * 255.0, b * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_MAX: [f64; 3] = [360.0, 100.0, 100.0];
    const LEGACY_MAX: [f64; 3] = [255.0, 255.0, 255.0];

    fn assert_rgb_close(got: RgbColor, want: (f64, f64, f64)) {
        assert!(
            (got.red - want.0).abs() < 1e-9
                && (got.green - want.1).abs() < 1e-9
                && (got.blue - want.2).abs() < 1e-9,
            "got {:?}, want {:?}",
            got,
            want
        );
    }

    #[test]
    fn test_primary_sectors() {
        let red = hsv_to_rgb(HsvColor::new(0.0, 100.0, 100.0), STANDARD_MAX);
        assert_eq!(red, RgbColor::new(255.0, 0.0, 0.0));

        let green = hsv_to_rgb(HsvColor::new(120.0, 100.0, 100.0), STANDARD_MAX);
        assert_rgb_close(green, (0.0, 255.0, 0.0));

        let blue = hsv_to_rgb(HsvColor::new(240.0, 100.0, 100.0), STANDARD_MAX);
        assert_rgb_close(blue, (0.0, 0.0, 255.0));

        let cyan = hsv_to_rgb(HsvColor::new(180.0, 100.0, 100.0), STANDARD_MAX);
        assert_eq!(cyan, RgbColor::new(0.0, 255.0, 255.0));
    }

    #[test]
    fn test_zero_saturation_is_exact_gray() {
        // Hue must not matter once saturation is zero.
        for hue in [0.0, 77.3, 255.0] {
            let gray = hsv_to_rgb(HsvColor::new(hue, 0.0, 128.0), LEGACY_MAX);
            let level = 128.0 / 255.0 * 255.0;
            assert_eq!(gray, RgbColor::new(level, level, level));
        }
    }

    #[test]
    fn test_full_range_hue_wraps_to_zero() {
        let wrapped = hsv_to_rgb(HsvColor::new(360.0, 100.0, 100.0), STANDARD_MAX);
        assert_eq!(wrapped, RgbColor::new(255.0, 0.0, 0.0));

        let wrapped = hsv_to_rgb(HsvColor::new(255.0, 255.0, 255.0), LEGACY_MAX);
        assert_eq!(wrapped, RgbColor::new(255.0, 0.0, 0.0));
    }

    #[test]
    fn test_value_scales_output() {
        let dim = hsv_to_rgb(HsvColor::new(0.0, 100.0, 50.0), STANDARD_MAX);
        assert_rgb_close(dim, (127.5, 0.0, 0.0));
    }

    #[test]
    fn test_conventions_agree_on_shared_colors() {
        // Full-saturation red is expressible in both conventions.
        let legacy = hsv_to_rgb(HsvColor::new(0.0, 255.0, 255.0), LEGACY_MAX);
        let standard = hsv_to_rgb(HsvColor::new(0.0, 100.0, 100.0), STANDARD_MAX);
        assert_eq!(legacy, standard);
    }

    #[test]
    fn test_rounded_channels() {
        assert_eq!(RgbColor::new(127.5, 0.2, 254.9).rounded(), [128, 0, 255]);
    }
}
