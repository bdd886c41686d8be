use serde::{Deserialize, Serialize};

use crate::error::VibError;

/// A least-squares calibration line relating a known quantity (degree of
/// substitution, concentration, ...) to a measured band summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLine {
    pub slope: f64,
    pub intercept: f64,
}

impl CalibrationLine {
    /// Measured response predicted for a known quantity `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Places a measured response `y` back on the calibration axis.
    /// A flat line cannot be inverted.
    pub fn invert(&self, y: f64) -> Result<f64, VibError> {
        if self.slope == 0.0 {
            return Err(VibError::OutOfBounds(
                "calibration line has zero slope and cannot be inverted".into(),
            ));
        }
        Ok((y - self.intercept) / self.slope)
    }
}

/// Fits a line through `(quantity, response)` reference points by least
/// squares. Needs at least two points with distinct quantities; a line
/// through exactly two distinct points is exact.
///
/// # Examples
///
/// ```
/// use vibcore::algorithm::calibration::fit_line;
/// // Non-acetylated and 85 % acetylated references.
/// let line = fit_line(&[(0.0, 0.10), (0.85, 0.78)]).unwrap();
/// assert!((line.predict(0.85) - 0.78).abs() < 1e-12);
/// assert!((line.invert(0.44).unwrap() - 0.425).abs() < 1e-12);
/// ```
pub fn fit_line(points: &[(f64, f64)]) -> Result<CalibrationLine, VibError> {
    if points.len() < 2 {
        return Err(VibError::DimensionMismatch(format!(
            "calibration needs at least two reference points, got {}",
            points.len()
        )));
    }
    let n = points.len() as f64;
    let sx: f64 = points.iter().map(|(x, _)| x).sum();
    let sy: f64 = points.iter().map(|(_, y)| y).sum();
    let sxx: f64 = points.iter().map(|(x, _)| x * x).sum();
    let sxy: f64 = points.iter().map(|(x, y)| x * y).sum();

    let denom = n * sxx - sx * sx;
    if denom.abs() < f64::EPSILON {
        return Err(VibError::OutOfBounds(
            "calibration quantities are degenerate (zero variance)".into(),
        ));
    }
    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;
    Ok(CalibrationLine { slope, intercept })
}
