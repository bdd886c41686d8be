use crate::algorithm::region::integrate_region;
use crate::algorithm::utility::savgol_5_2;
use crate::error::VibError;

/// Percent transmission to absorbance, element-wise: `A = -log10(T / 100)`.
///
/// Only valid on transmission data; the unit-state gate lives on
/// [`crate::data::spectrum::Spectrum::to_absorbance`], this function is
/// the raw math.
pub fn transmission_to_absorbance(column: &mut [f64]) {
    for v in column.iter_mut() {
        *v = -(*v / 100.0).log10();
    }
}

/// Absorbance to percent transmission, the exact inverse of
/// [`transmission_to_absorbance`]: `T = 100 * 10^(-A)`.
pub fn absorbance_to_transmission(column: &mut [f64]) {
    for v in column.iter_mut() {
        *v = 100.0 * 10f64.powf(-*v);
    }
}

/// Divides every sample by the trapezoidal integral over the given index
/// range, so the window integrates to exactly 1 afterwards. A window that
/// integrates to zero is rejected rather than flooding the column with
/// infinities.
pub fn normalize_area(
    column: &mut [f64],
    start_index: usize,
    end_index: usize,
) -> Result<(), VibError> {
    let area = integrate_region(column, start_index, end_index);
    if area == 0.0 {
        return Err(VibError::OutOfBounds(
            "normalization window integrates to zero".into(),
        ));
    }
    for v in column.iter_mut() {
        *v /= area;
    }
    Ok(())
}

/// Divides every sample by the value at `index`, so the column equals
/// exactly 1.0 there afterwards. A zero sample at the index is rejected.
pub fn normalize_peak(column: &mut [f64], index: usize) -> Result<(), VibError> {
    let peak = column[index];
    if peak == 0.0 {
        return Err(VibError::OutOfBounds(
            "peak value at the normalization index is zero".into(),
        ));
    }
    for v in column.iter_mut() {
        *v /= peak;
    }
    Ok(())
}

/// Cosmic-spike suppression: one Savitzky-Golay pass (5-sample window,
/// degree 2) in place. Lossy by nature: sharp real features lose a
/// little height, and isolated outliers may survive the single pass.
pub fn remove_spikes(column: &mut [f64]) {
    let smoothed = savgol_5_2(column);
    column.copy_from_slice(&smoothed);
}
