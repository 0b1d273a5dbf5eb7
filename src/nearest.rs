//! Nearest legal color search.

use crate::color::RgbColor;
use crate::error::QuantizeError;

/// Squared Euclidean distance between two RGB points.
fn squared_distance(a: &RgbColor, b: &RgbColor) -> f64 {
    let dr = a.red - b.red;
    let dg = a.green - b.green;
    let db = a.blue - b.blue;
    dr * dr + dg * dg + db * db
}

/// Find the candidate closest to `target` by squared Euclidean distance in
/// RGB space.
///
/// The scan keeps the first minimum, so ties resolve to the earliest
/// candidate; callers must not depend on which of two equidistant candidates
/// wins once candidate order changes.
pub fn nearest_color<'a>(
    target: &RgbColor,
    candidates: &'a [RgbColor],
) -> Result<&'a RgbColor, QuantizeError> {
    let (first, rest) = candidates.split_first().ok_or(QuantizeError::EmptyPalette)?;

    let mut best = first;
    let mut best_dist = squared_distance(target, first);
    for candidate in rest {
        let dist = squared_distance(target, candidate);
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }

    Ok(best)
}
