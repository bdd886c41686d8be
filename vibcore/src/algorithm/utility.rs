//! Shared numeric helpers for the spectral engine.
//!
//! Everything here operates on plain `&[f64]` slices; the matrix-aware
//! callers live in `data::spectrum`.

/// Returns true when `values` is strictly ascending or strictly descending.
///
/// Raman shift axes usually ascend, IR wavenumber axes usually descend;
/// both are legal. Slices with fewer than two samples are trivially
/// monotonic.
pub fn is_strictly_monotonic(values: &[f64]) -> bool {
    if values.len() < 2 {
        return true;
    }
    let ascending = values[1] > values[0];
    values.windows(2).all(|w| {
        if ascending {
            w[1] > w[0]
        } else {
            w[1] < w[0]
        }
    })
}

/// Centered moving-window mean with the window clamped at both edges,
/// so no sample outside the slice is ever read.
///
/// # Examples
///
/// ```
/// use vibcore::algorithm::utility::moving_average;
/// let smoothed = moving_average(&[1.0, 1.0, 10.0, 1.0, 1.0], 3);
/// assert_eq!(smoothed[2], 4.0);
/// assert_eq!(smoothed[0], 1.0);
/// ```
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || window <= 1 {
        return values.to_vec();
    }
    let half = window / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let span = &values[lo..=hi];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

/// Window used by the baseline tracker: roughly a tenth of the spectrum,
/// at least 5 samples, always odd so the window has a center sample.
pub fn default_smooth_window(n: usize) -> usize {
    let w = (n / 10).max(5);
    if w % 2 == 0 {
        w + 1
    } else {
        w
    }
}

/// Savitzky-Golay filter, fixed 5-sample window, degree-2 polynomial.
///
/// Interior samples use the standard (-3, 12, 17, 12, -3)/35 kernel. The
/// two samples at each edge evaluate the least-squares quadratic fitted to
/// the terminal window, matching `savgol_filter(..., mode="interp")`.
/// A degree-2 input is reproduced exactly, edges included. Slices shorter
/// than the window are returned unchanged.
pub fn savgol_5_2(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 5 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(n);

    let left = quad_fit_5(&values[..5]);
    out.push(eval_quad(left, -2.0));
    out.push(eval_quad(left, -1.0));

    for i in 2..n - 2 {
        let w = &values[i - 2..=i + 2];
        out.push((-3.0 * w[0] + 12.0 * w[1] + 17.0 * w[2] + 12.0 * w[3] - 3.0 * w[4]) / 35.0);
    }

    let right = quad_fit_5(&values[n - 5..]);
    out.push(eval_quad(right, 1.0));
    out.push(eval_quad(right, 2.0));
    out
}

/// Least-squares quadratic through five samples at x = -2..=2.
/// Closed-form normal equations; returns (a0, a1, a2).
fn quad_fit_5(w: &[f64]) -> (f64, f64, f64) {
    let sy: f64 = w.iter().sum();
    let sxy = -2.0 * w[0] - w[1] + w[3] + 2.0 * w[4];
    let sxxy = 4.0 * w[0] + w[1] + w[3] + 4.0 * w[4];
    let a0 = (17.0 * sy - 5.0 * sxxy) / 35.0;
    let a1 = sxy / 10.0;
    let a2 = (sxxy - 2.0 * sy) / 14.0;
    (a0, a1, a2)
}

fn eval_quad((a0, a1, a2): (f64, f64, f64), x: f64) -> f64 {
    a0 + a1 * x + a2 * x * x
}
