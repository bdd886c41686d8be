use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::error::VibError;

/// Index of the abscissa sample closest (by absolute difference) to
/// `value`. Ties break to the lowest index. An empty slice yields 0;
/// `Spectrum` construction guarantees a non-empty axis.
///
/// Resolving the abscissa value at a given index returns that same index,
/// so snapping is idempotent.
///
/// # Examples
///
/// ```
/// use vibcore::algorithm::region::nearest_index;
/// let shift = [800.0, 900.0, 1000.0, 1100.0];
/// assert_eq!(nearest_index(&shift, 1020.0), 2);
/// assert_eq!(nearest_index(&shift, shift[1]), 1);
/// ```
pub fn nearest_index(abscissa: &[f64], value: f64) -> usize {
    abscissa
        .iter()
        .position_min_by_key(|&&x| OrderedFloat((x - value).abs()))
        .unwrap_or(0)
}

/// Value range of an axis, as (min, max). Works for ascending and
/// descending axes alike.
pub fn axis_range(abscissa: &[f64]) -> (f64, f64) {
    let min = abscissa.iter().copied().fold(f64::INFINITY, f64::min);
    let max = abscissa.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Converts a pair of physical bounds into an ordered index pair.
///
/// The bounds may come in either order. Both must lie within
/// `[min(abscissa), max(abscissa)]` inclusive, each validated
/// independently against the argument the caller actually passed,
/// otherwise `OutOfBounds` is returned before anything is snapped. On a
/// descending axis the lower physical bound snaps to the higher index,
/// so the returned pair is ordered by index.
pub fn snap_bounds(abscissa: &[f64], start: f64, end: f64) -> Result<(usize, usize), VibError> {
    let (axis_min, axis_max) = axis_range(abscissa);
    for (name, value) in [("start", start), ("end", end)] {
        if value < axis_min || value > axis_max {
            return Err(VibError::OutOfBounds(format!(
                "{name} bound {value} lies outside the axis range [{axis_min}, {axis_max}]"
            )));
        }
    }
    let a = nearest_index(abscissa, start);
    let b = nearest_index(abscissa, end);
    Ok((a.min(b), a.max(b)))
}

/// Definite integral of one intensity column via the trapezoidal rule
/// over the closed index interval `[min(a, b), max(a, b)]`, with unit
/// sample spacing. Symmetric under swapped arguments; a degenerate
/// single-index interval integrates to 0.
///
/// # Examples
///
/// ```
/// use vibcore::algorithm::region::integrate_region;
/// let band = [0.0, 2.0, 4.0, 2.0, 0.0];
/// assert_eq!(integrate_region(&band, 0, 4), 8.0);
/// assert_eq!(integrate_region(&band, 4, 0), 8.0);
/// ```
pub fn integrate_region(column: &[f64], start_index: usize, end_index: usize) -> f64 {
    let (a, b) = (start_index.min(end_index), start_index.max(end_index));
    column[a..=b]
        .iter()
        .tuple_windows()
        .map(|(left, right)| 0.5 * (left + right))
        .sum()
}

/// Single-sample read at an index position. No interpolation between
/// samples takes place; callers snap physical positions with
/// [`nearest_index`] first.
pub fn read_at(column: &[f64], index: usize) -> f64 {
    column[index]
}
