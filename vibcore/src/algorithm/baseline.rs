use serde::{Deserialize, Serialize};

use crate::algorithm::utility::{default_smooth_window, moving_average};
use crate::error::VibError;

/// Shape parameters for a parametric baseline.
///
/// The baseline is a convex blend between a straight line and a smoothed
/// copy of the spectrum itself:
///
/// * `coarseness` in `[0, 1]`: blend weight. 0 gives the pure straight
///   line, 1 gives the fully spectrum-tracking curve. Lower is safer: a
///   high value starts eroding real bands.
/// * `angle` in degrees, `[-90, 90]`: tilt of the straight component,
///   mapped through the tangent so a vertical line is unreachable.
/// * `offset`: height of the straight component at the left edge of the
///   axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaselineParams {
    pub coarseness: f64,
    pub angle: f64,
    pub offset: f64,
}

impl BaselineParams {
    pub fn new(coarseness: f64, angle: f64, offset: f64) -> Self {
        BaselineParams {
            coarseness,
            angle,
            offset,
        }
    }

    /// Eager domain check; runs before any computation so a violation
    /// never leaves a spectrum partially corrected.
    pub fn validate(&self) -> Result<(), VibError> {
        if !(0.0..=1.0).contains(&self.coarseness) {
            return Err(VibError::OutOfBounds(format!(
                "coarseness {} lies outside [0, 1]",
                self.coarseness
            )));
        }
        if self.angle.abs() > 90.0 {
            return Err(VibError::OutOfBounds(format!(
                "angle {} lies outside [-90, 90] degrees",
                self.angle
            )));
        }
        Ok(())
    }

    /// An all-zero triple describes an all-zero baseline; subtracting it
    /// is never a meaningful request and is treated as operator error.
    pub fn is_zero(&self) -> bool {
        self.coarseness == 0.0 && self.angle == 0.0 && self.offset == 0.0
    }
}

/// Computes a baseline curve for one intensity column.
///
/// The straight component is `tan(angle) * (x - x[0]) + offset`; the
/// tracking component is a centered moving-window mean of the intensity
/// (window [`default_smooth_window`], clamped at the edges so the curve
/// never extrapolates outside the axis). The result is
/// `(1 - coarseness) * line + coarseness * smoothed`, same length as the
/// input. Subtract it from the column to remove the slow-varying
/// background while keeping sharp features.
///
/// For kinetic data, call once per column: every spectrum in a batch
/// gets its own independently fitted baseline from the same scalar
/// parameters.
///
/// # Examples
///
/// ```
/// use vibcore::algorithm::baseline::{compute_baseline, BaselineParams};
/// let abscissa = [0.0, 1.0, 2.0, 3.0];
/// let intensity = [7.0, 9.0, 8.0, 7.5];
/// let params = BaselineParams::new(0.0, 0.0, 5.0);
/// let baseline = compute_baseline(&abscissa, &intensity, &params).unwrap();
/// assert_eq!(baseline, vec![5.0; 4]);
/// ```
pub fn compute_baseline(
    abscissa: &[f64],
    intensity: &[f64],
    params: &BaselineParams,
) -> Result<Vec<f64>, VibError> {
    params.validate()?;
    if abscissa.len() != intensity.len() {
        return Err(VibError::DimensionMismatch(format!(
            "abscissa has {} samples, intensity has {}",
            abscissa.len(),
            intensity.len()
        )));
    }

    let slope = params.angle.to_radians().tan();
    let x0 = abscissa.first().copied().unwrap_or(0.0);
    let c = params.coarseness;
    let smoothed = moving_average(intensity, default_smooth_window(intensity.len()));

    Ok(abscissa
        .iter()
        .zip(smoothed)
        .map(|(&x, s)| {
            let line = slope * (x - x0) + params.offset;
            (1.0 - c) * line + c * s
        })
        .collect())
}
