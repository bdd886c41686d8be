use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use bincode::{Decode, Encode};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithm::baseline::{compute_baseline, BaselineParams};
use crate::algorithm::region::{axis_range, integrate_region, nearest_index, read_at, snap_bounds};
use crate::algorithm::transform;
use crate::algorithm::utility::is_strictly_monotonic;
use crate::error::VibError;
use crate::io::interface::{ParameterPicker, RawSpectrum};

/// Representation state of IR intensity data. Raman spectra carry no unit
/// state (they stay in detector counts); for IR spectra the two states
/// gate which operations are legal and are exact inverses of each other.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Encode, Decode)]
pub enum UnitState {
    Transmission,
    Absorbance,
}

impl Display for UnitState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Transmission => write!(f, "%T"),
            UnitState::Absorbance => write!(f, "Abs"),
        }
    }
}

/// Derived band summary attached after integration or a peak read.
/// Kinetic integration yields one integral per timestamp; a peak read
/// yields a single value.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Encode, Decode)]
pub enum Summary {
    Integrals(Vec<f64>),
    Peak(f64),
}

/// Normalization mode. The variants carry exactly the bounds they need,
/// so an invalid argument combination is unrepresentable.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum Normalization {
    /// Divide by the band integral between two physical bounds
    /// (either order).
    Area { start: f64, end: f64 },
    /// Divide by the sample nearest to a physical position.
    Peak { position: f64 },
}

/// A one-dimensional spectroscopic dataset: a single spectrum or a
/// kinetic time series sharing one abscissa.
///
/// The abscissa (Raman shift or IR wavenumber) is `Arc`-shared and never
/// mutated; `intensity` holds one column per timestamp and is the only
/// field the engine operations mutate. `raw` is the load-time snapshot
/// kept for provenance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spectrum {
    pub abscissa: Arc<Vec<f64>>,
    pub intensity: DMatrix<f64>,
    raw: DMatrix<f64>,
    pub timestamps: Vec<f64>,
    pub units: Option<UnitState>,
    pub label: String,
    id: Uuid,
    summary: Option<Summary>,
}

impl Spectrum {
    /// Builds a spectrum after validating the shape invariants: a
    /// non-empty, strictly monotonic abscissa whose length equals the
    /// intensity row count, and one timestamp per intensity column.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use vibcore::data::spectrum::Spectrum;
    ///
    /// let intensity = DMatrix::from_vec(3, 1, vec![1.0, 2.0, 1.0]);
    /// let spectrum =
    ///     Spectrum::new(vec![100.0, 200.0, 300.0], intensity, vec![0.0], None, "sample_a");
    /// assert!(spectrum.is_ok());
    /// ```
    pub fn new(
        abscissa: Vec<f64>,
        intensity: DMatrix<f64>,
        timestamps: Vec<f64>,
        units: Option<UnitState>,
        label: impl Into<String>,
    ) -> Result<Self, VibError> {
        if abscissa.is_empty() {
            return Err(VibError::DimensionMismatch("abscissa is empty".into()));
        }
        if abscissa.len() != intensity.nrows() {
            return Err(VibError::DimensionMismatch(format!(
                "abscissa has {} samples but intensity has {} rows",
                abscissa.len(),
                intensity.nrows()
            )));
        }
        if timestamps.len() != intensity.ncols() {
            return Err(VibError::DimensionMismatch(format!(
                "{} timestamps for {} spectra",
                timestamps.len(),
                intensity.ncols()
            )));
        }
        if !is_strictly_monotonic(&abscissa) {
            return Err(VibError::OutOfBounds(
                "abscissa must be strictly monotonic".into(),
            ));
        }
        let raw = intensity.clone();
        Ok(Spectrum {
            abscissa: Arc::new(abscissa),
            intensity,
            raw,
            timestamps,
            units,
            label: label.into(),
            id: Uuid::new_v4(),
            summary: None,
        })
    }

    /// Raman spectrum or kinetic series; no unit gating applies.
    pub fn raman(
        abscissa: Vec<f64>,
        intensity: DMatrix<f64>,
        timestamps: Vec<f64>,
        label: impl Into<String>,
    ) -> Result<Self, VibError> {
        Self::new(abscissa, intensity, timestamps, None, label)
    }

    /// Single IR spectrum in the given unit state. IR data is always a
    /// single column with a degenerate timestamp.
    pub fn ir(
        abscissa: Vec<f64>,
        intensity: Vec<f64>,
        units: UnitState,
        label: impl Into<String>,
    ) -> Result<Self, VibError> {
        let n = intensity.len();
        Self::new(
            abscissa,
            DMatrix::from_vec(n, 1, intensity),
            vec![0.0],
            Some(units),
            label,
        )
    }

    /// Adopts a loader hand-off tuple, running the same validation as
    /// [`Spectrum::new`].
    pub fn from_raw(raw: RawSpectrum) -> Result<Self, VibError> {
        Self::new(
            raw.abscissa,
            raw.intensity,
            raw.timestamps,
            raw.units,
            raw.label,
        )
    }

    /// Opaque provenance tag assigned at construction. Display only;
    /// never used for equality or lookup.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Load-time snapshot of the intensity data, untouched by any
    /// mutating operation.
    pub fn raw(&self) -> &DMatrix<f64> {
        &self.raw
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn num_points(&self) -> usize {
        self.abscissa.len()
    }

    pub fn num_spectra(&self) -> usize {
        self.intensity.ncols()
    }

    pub fn is_kinetic(&self) -> bool {
        self.num_spectra() > 1
    }

    /// Value range of the abscissa as (min, max), for either axis
    /// direction.
    pub fn abscissa_range(&self) -> (f64, f64) {
        axis_range(&self.abscissa)
    }

    fn require_absorbance(&self, operation: &str) -> Result<(), VibError> {
        match self.units {
            Some(UnitState::Transmission) => Err(VibError::InvalidStateTransition(format!(
                "{operation} requires absorbance data, spectrum is in transmission"
            ))),
            _ => Ok(()),
        }
    }

    fn snap_position(&self, position: f64) -> Result<usize, VibError> {
        let (axis_min, axis_max) = self.abscissa_range();
        if position < axis_min || position > axis_max {
            return Err(VibError::OutOfBounds(format!(
                "position {position} lies outside the axis range [{axis_min}, {axis_max}]"
            )));
        }
        Ok(nearest_index(&self.abscissa, position))
    }

    fn column_vec(&self, j: usize) -> Vec<f64> {
        self.intensity.column(j).iter().copied().collect()
    }

    /// Converts percent transmission to absorbance in place and flips
    /// the unit state. Legal only on an IR spectrum currently in
    /// transmission; on failure the data and state are unchanged.
    pub fn to_absorbance(&mut self) -> Result<(), VibError> {
        match self.units {
            Some(UnitState::Transmission) => {
                transform::transmission_to_absorbance(self.intensity.as_mut_slice());
                self.units = Some(UnitState::Absorbance);
                Ok(())
            }
            Some(UnitState::Absorbance) => Err(VibError::InvalidStateTransition(
                "spectrum is already in absorbance".into(),
            )),
            None => Err(VibError::InvalidStateTransition(
                "unit conversion applies to IR spectra only".into(),
            )),
        }
    }

    /// Exact inverse of [`Spectrum::to_absorbance`], with the symmetric
    /// legality rule.
    pub fn to_transmission(&mut self) -> Result<(), VibError> {
        match self.units {
            Some(UnitState::Absorbance) => {
                transform::absorbance_to_transmission(self.intensity.as_mut_slice());
                self.units = Some(UnitState::Transmission);
                Ok(())
            }
            Some(UnitState::Transmission) => Err(VibError::InvalidStateTransition(
                "spectrum is already in transmission".into(),
            )),
            None => Err(VibError::InvalidStateTransition(
                "unit conversion applies to IR spectra only".into(),
            )),
        }
    }

    /// Subtracts a parametric baseline from every column in place. Each
    /// column gets its own independently fitted baseline from the same
    /// scalar parameters; baselines are never shared or averaged across
    /// a kinetic series.
    ///
    /// The baseline brings the spectrum to it: samples above it come
    /// down, samples below it come up. An all-zero parameter triple is a
    /// no-op that only logs a warning; a zero baseline is never a
    /// meaningful request.
    pub fn baseline(&mut self, params: BaselineParams) -> Result<(), VibError> {
        self.require_absorbance("baseline correction")?;
        params.validate()?;
        if params.is_zero() {
            log::warn!(
                "baseline parameters for '{}' are all zero; nothing to subtract",
                self.label
            );
            return Ok(());
        }
        self.subtract_baselines(&params)
    }

    /// Baseline correction with parameters discovered interactively. The
    /// picker blocks until the operator confirms or closes the window;
    /// closing returns the supplied defaults, which subtract nothing.
    pub fn baseline_interactive(
        &mut self,
        picker: &mut dyn ParameterPicker,
    ) -> Result<(), VibError> {
        self.require_absorbance("baseline correction")?;
        let params = picker.pick_baseline(&self.abscissa, &self.intensity, BaselineParams::default());
        params.validate()?;
        self.subtract_baselines(&params)
    }

    fn subtract_baselines(&mut self, params: &BaselineParams) -> Result<(), VibError> {
        for j in 0..self.intensity.ncols() {
            let column = self.column_vec(j);
            let base = compute_baseline(&self.abscissa, &column, params)?;
            for (v, b) in self.intensity.column_mut(j).iter_mut().zip(base) {
                *v -= b;
            }
        }
        log::debug!(
            "baseline corrected {} column(s) of '{}'",
            self.intensity.ncols(),
            self.label
        );
        Ok(())
    }

    /// Normalizes every column in place, by band area or by peak value.
    /// IR data must be in absorbance. All denominators are validated
    /// before the first column is touched, so a failure never leaves the
    /// series partially normalized. Deliberately destructive: `raw` keeps
    /// the pre-normalization record.
    pub fn normalize(&mut self, mode: Normalization) -> Result<(), VibError> {
        self.require_absorbance("normalization")?;
        match mode {
            Normalization::Area { start, end } => {
                let (a, b) = snap_bounds(&self.abscissa, start, end)?;
                for j in 0..self.intensity.ncols() {
                    if integrate_region(&self.column_vec(j), a, b) == 0.0 {
                        return Err(VibError::OutOfBounds(format!(
                            "normalization window integrates to zero in column {j}"
                        )));
                    }
                }
                for j in 0..self.intensity.ncols() {
                    let mut column = self.column_vec(j);
                    transform::normalize_area(&mut column, a, b)?;
                    self.intensity.column_mut(j).copy_from_slice(&column);
                }
            }
            Normalization::Peak { position } => {
                let idx = self.snap_position(position)?;
                for j in 0..self.intensity.ncols() {
                    if self.intensity[(idx, j)] == 0.0 {
                        return Err(VibError::OutOfBounds(format!(
                            "peak value at the normalization position is zero in column {j}"
                        )));
                    }
                }
                for j in 0..self.intensity.ncols() {
                    let mut column = self.column_vec(j);
                    transform::normalize_peak(&mut column, idx)?;
                    self.intensity.column_mut(j).copy_from_slice(&column);
                }
            }
        }
        Ok(())
    }

    /// Integrates a band between two physical bounds (either order) in
    /// every column and attaches the result as [`Summary::Integrals`],
    /// aligned with `timestamps`. IR data must be in absorbance. On
    /// failure any previous summary is kept unchanged.
    pub fn integrate(&mut self, start: f64, end: f64) -> Result<(), VibError> {
        self.require_absorbance("integration")?;
        let (a, b) = snap_bounds(&self.abscissa, start, end)?;
        let integrals: Vec<f64> = (0..self.intensity.ncols())
            .map(|j| integrate_region(&self.column_vec(j), a, b))
            .collect();
        self.summary = Some(Summary::Integrals(integrals));
        Ok(())
    }

    /// Integration with bounds discovered interactively; the axis range
    /// is offered as the default region.
    pub fn integrate_interactive(
        &mut self,
        picker: &mut dyn ParameterPicker,
    ) -> Result<(), VibError> {
        let defaults = self.abscissa_range();
        let (start, end) = picker.pick_region(&self.abscissa, &self.intensity, defaults);
        self.integrate(start, end)
    }

    /// Reads the sample nearest to a physical position, without
    /// interpolation, and attaches it as [`Summary::Peak`]. Defined for
    /// single spectra; kinetic band tracking goes through
    /// [`Spectrum::integrate`].
    pub fn read_value_at(&mut self, position: f64) -> Result<f64, VibError> {
        self.require_absorbance("peak read")?;
        if self.is_kinetic() {
            return Err(VibError::DimensionMismatch(
                "peak read expects a single spectrum, got a kinetic series".into(),
            ));
        }
        let idx = self.snap_position(position)?;
        let value = read_at(&self.column_vec(0), idx);
        self.summary = Some(Summary::Peak(value));
        Ok(value)
    }

    /// Peak read at an interactively picked position; the axis midpoint
    /// is offered as the default.
    pub fn read_value_at_interactive(
        &mut self,
        picker: &mut dyn ParameterPicker,
    ) -> Result<f64, VibError> {
        let (axis_min, axis_max) = self.abscissa_range();
        let position =
            picker.pick_position(&self.abscissa, &self.intensity, 0.5 * (axis_min + axis_max));
        self.read_value_at(position)
    }

    /// One Savitzky-Golay pass (5-sample window, degree 2) per column,
    /// in place. Lossy: real features lose a little height and isolated
    /// spikes may survive.
    pub fn remove_spikes(&mut self) {
        for j in 0..self.intensity.ncols() {
            let mut column = self.column_vec(j);
            transform::remove_spikes(&mut column);
            self.intensity.column_mut(j).copy_from_slice(&column);
        }
    }

    fn integrals(&self) -> Result<&[f64], VibError> {
        match &self.summary {
            Some(Summary::Integrals(values)) => Ok(values),
            Some(Summary::Peak(_)) => Err(VibError::MissingDerivedState(
                "band integrals required, found a peak-value summary".into(),
            )),
            None => Err(VibError::MissingDerivedState(
                "no band integrals computed yet; call integrate first".into(),
            )),
        }
    }

    /// `(timestamp, integral)` pairs for kinetic trend rendering.
    /// Requires a kinetic series with [`Summary::Integrals`] attached.
    pub fn integral_trace(&self) -> Result<Vec<(f64, f64)>, VibError> {
        if !self.is_kinetic() {
            return Err(VibError::DimensionMismatch(
                "trend extraction requires a kinetic series".into(),
            ));
        }
        let integrals = self.integrals()?;
        Ok(self
            .timestamps
            .iter()
            .copied()
            .zip(integrals.iter().copied())
            .collect())
    }

    /// `(timestamp, 1 - I(t)/I(0))` pairs. Defined only for the integral
    /// summary form with a nonzero reference integral.
    pub fn conversion_trace(&self) -> Result<Vec<(f64, f64)>, VibError> {
        if !self.is_kinetic() {
            return Err(VibError::DimensionMismatch(
                "trend extraction requires a kinetic series".into(),
            ));
        }
        let integrals = self.integrals()?;
        let reference = integrals[0];
        if reference == 0.0 {
            return Err(VibError::OutOfBounds(
                "conversion is undefined: reference integral I(0) is zero".into(),
            ));
        }
        Ok(self
            .timestamps
            .iter()
            .copied()
            .zip(integrals.iter().map(|i| 1.0 - i / reference))
            .collect())
    }

    /// The single summary value of a non-kinetic spectrum, for
    /// value-per-spectrum comparison charts.
    pub fn summary_value(&self) -> Result<f64, VibError> {
        match &self.summary {
            Some(Summary::Peak(value)) => Ok(*value),
            Some(Summary::Integrals(values)) if values.len() == 1 => Ok(values[0]),
            Some(Summary::Integrals(_)) => Err(VibError::DimensionMismatch(
                "expected a single-spectrum summary, got a kinetic series".into(),
            )),
            None => Err(VibError::MissingDerivedState(
                "no band summary computed yet".into(),
            )),
        }
    }

    /// Explicit compatibility check for joint rendering: both spectra
    /// must agree on single-versus-kinetic shape and on unit state.
    /// Read-only; neither instance is touched.
    pub fn check_comparable(&self, other: &Spectrum) -> Result<(), VibError> {
        if self.is_kinetic() != other.is_kinetic() {
            return Err(VibError::DimensionMismatch(format!(
                "'{}' and '{}' mix single and kinetic data",
                self.label, other.label
            )));
        }
        if self.units != other.units {
            return Err(VibError::DimensionMismatch(format!(
                "'{}' and '{}' are in different unit states",
                self.label, other.label
            )));
        }
        Ok(())
    }
}

impl Display for Spectrum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let id = self.id.simple().to_string();
        write!(
            f,
            "Spectrum('{}' [{}], {} points x {} spectra",
            self.label,
            &id[..8],
            self.num_points(),
            self.num_spectra()
        )?;
        if let Some(units) = self.units {
            write!(f, ", {units}")?;
        }
        write!(f, ")")
    }
}

// Manual bincode implementation: the Arc axis, the matrix storage and the
// uuid all need explicit treatment.
impl Encode for Spectrum {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        bincode::Encode::encode(&*self.abscissa, encoder)?;
        bincode::Encode::encode(&self.intensity.nrows(), encoder)?;
        bincode::Encode::encode(&self.intensity.ncols(), encoder)?;
        bincode::Encode::encode(&self.intensity.as_slice().to_vec(), encoder)?;
        bincode::Encode::encode(&self.raw.as_slice().to_vec(), encoder)?;
        bincode::Encode::encode(&self.timestamps, encoder)?;
        bincode::Encode::encode(&self.units, encoder)?;
        bincode::Encode::encode(&self.label, encoder)?;
        bincode::Encode::encode(&self.id.as_u128(), encoder)?;
        bincode::Encode::encode(&self.summary, encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for Spectrum {
    fn decode<D: bincode::de::Decoder<Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let abscissa: Vec<f64> = bincode::Decode::decode(decoder)?;
        let nrows: usize = bincode::Decode::decode(decoder)?;
        let ncols: usize = bincode::Decode::decode(decoder)?;
        let intensity: Vec<f64> = bincode::Decode::decode(decoder)?;
        let raw: Vec<f64> = bincode::Decode::decode(decoder)?;
        // Reject malformed streams before matrix construction can panic.
        for (name, block) in [("intensity", &intensity), ("raw", &raw)] {
            if block.len() != nrows * ncols {
                return Err(bincode::error::DecodeError::OtherString(format!(
                    "{name} block of {} values does not fill a {nrows}x{ncols} matrix",
                    block.len()
                )));
            }
        }
        let timestamps: Vec<f64> = bincode::Decode::decode(decoder)?;
        let units: Option<UnitState> = bincode::Decode::decode(decoder)?;
        let label: String = bincode::Decode::decode(decoder)?;
        let id: u128 = bincode::Decode::decode(decoder)?;
        let summary: Option<Summary> = bincode::Decode::decode(decoder)?;
        Ok(Spectrum {
            abscissa: Arc::new(abscissa),
            intensity: DMatrix::from_vec(nrows, ncols, intensity),
            raw: DMatrix::from_vec(nrows, ncols, raw),
            timestamps,
            units,
            label,
            id: Uuid::from_u128(id),
            summary,
        })
    }
}

impl<'de, Context> bincode::BorrowDecode<'de, Context> for Spectrum {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        bincode::Decode::decode(decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::interface::{snapshot_from_bytes, snapshot_to_bytes};

    fn ramp_axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| 400.0 + 2.0 * i as f64).collect()
    }

    /// Two-column kinetic series: a flat column and a triangular band.
    fn kinetic_fixture() -> Spectrum {
        let n = 9;
        let mut data = vec![1.0; n];
        data.extend((0..n).map(|i| 1.0 + (4.0 - (i as f64 - 4.0).abs())));
        Spectrum::raman(
            ramp_axis(n),
            DMatrix::from_vec(n, 2, data),
            vec![0.0, 60.0],
            "kinetic_run",
        )
        .unwrap()
    }

    fn ir_fixture(units: UnitState) -> Spectrum {
        Spectrum::ir(
            ramp_axis(8),
            vec![50.0, 40.0, 25.0, 10.0, 25.0, 40.0, 50.0, 55.0],
            units,
            "ir_sample",
        )
        .unwrap()
    }

    #[test]
    fn test_constructor_validates_shape() {
        let intensity = DMatrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            Spectrum::raman(vec![1.0, 2.0], intensity.clone(), vec![0.0], "x"),
            Err(VibError::DimensionMismatch(_))
        ));
        assert!(matches!(
            Spectrum::raman(vec![1.0, 2.0, 3.0], intensity.clone(), vec![0.0, 1.0], "x"),
            Err(VibError::DimensionMismatch(_))
        ));
        assert!(matches!(
            Spectrum::raman(vec![1.0, 3.0, 2.0], intensity, vec![0.0], "x"),
            Err(VibError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_unit_round_trip_restores_values_and_state() {
        let mut spectrum = ir_fixture(UnitState::Transmission);
        let original = spectrum.intensity.clone();
        spectrum.to_absorbance().unwrap();
        assert_eq!(spectrum.units, Some(UnitState::Absorbance));
        spectrum.to_transmission().unwrap();
        assert_eq!(spectrum.units, Some(UnitState::Transmission));
        for (a, b) in original.iter().zip(spectrum.intensity.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_illegal_transition_leaves_state_unchanged() {
        let mut spectrum = ir_fixture(UnitState::Absorbance);
        let before = spectrum.intensity.clone();
        let err = spectrum.to_absorbance().unwrap_err();
        assert!(matches!(err, VibError::InvalidStateTransition(_)));
        assert_eq!(spectrum.units, Some(UnitState::Absorbance));
        assert_eq!(before, spectrum.intensity);

        let mut raman = kinetic_fixture();
        assert!(matches!(
            raman.to_absorbance(),
            Err(VibError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_baseline_rejected_in_transmission() {
        let mut spectrum = ir_fixture(UnitState::Transmission);
        let err = spectrum
            .baseline(BaselineParams::new(0.2, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, VibError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_zero_baseline_is_a_noop() {
        let mut spectrum = kinetic_fixture();
        let before = spectrum.intensity.clone();
        spectrum.baseline(BaselineParams::default()).unwrap();
        assert_eq!(before, spectrum.intensity);
    }

    #[test]
    fn test_baseline_is_fitted_per_column() {
        let mut spectrum = kinetic_fixture();
        // Full tracking: each column subtracts its own smoothed self.
        spectrum
            .baseline(BaselineParams::new(1.0, 0.0, 0.0))
            .unwrap();
        // The flat column collapses to zero exactly.
        assert!(spectrum
            .intensity
            .column(0)
            .iter()
            .all(|&v| v.abs() < 1e-12));
        // The banded column keeps structure the smoother could not track.
        assert!(spectrum
            .intensity
            .column(1)
            .iter()
            .any(|&v| v.abs() > 0.1));
    }

    #[test]
    fn test_baseline_never_touches_raw() {
        let mut spectrum = kinetic_fixture();
        let raw_before = spectrum.raw().clone();
        spectrum
            .baseline(BaselineParams::new(0.5, 10.0, 1.0))
            .unwrap();
        spectrum.remove_spikes();
        assert_eq!(&raw_before, spectrum.raw());
    }

    #[test]
    fn test_integrate_attaches_summary_per_column() {
        let mut spectrum = kinetic_fixture();
        let (lo, hi) = spectrum.abscissa_range();
        spectrum.integrate(hi, lo).unwrap();
        match spectrum.summary() {
            Some(Summary::Integrals(values)) => {
                assert_eq!(values.len(), 2);
                // Flat column of ones over 8 unit-spaced intervals.
                assert!((values[0] - 8.0).abs() < 1e-12);
                assert!(values[1] > values[0]);
            }
            other => panic!("expected integrals, got {other:?}"),
        }
    }

    #[test]
    fn test_integrate_out_of_bounds_keeps_summary_unset() {
        let mut spectrum = kinetic_fixture();
        let (_, hi) = spectrum.abscissa_range();
        let err = spectrum.integrate(0.0, hi + 100.0).unwrap_err();
        assert!(matches!(err, VibError::OutOfBounds(_)));
        assert!(spectrum.summary().is_none());
    }

    #[test]
    fn test_normalize_validates_both_bounds() {
        // Regression guard: start and end must each be checked, not the
        // same bound twice.
        let mut spectrum = kinetic_fixture();
        let (lo, hi) = spectrum.abscissa_range();
        assert!(matches!(
            spectrum.normalize(Normalization::Area {
                start: lo - 1.0,
                end: hi,
            }),
            Err(VibError::OutOfBounds(_))
        ));
        assert!(matches!(
            spectrum.normalize(Normalization::Area {
                start: lo,
                end: hi + 1.0,
            }),
            Err(VibError::OutOfBounds(_))
        ));
        assert!(spectrum
            .normalize(Normalization::Area { start: lo, end: hi })
            .is_ok());
    }

    #[test]
    fn test_normalize_peak_sets_unity_in_every_column() {
        let mut spectrum = kinetic_fixture();
        let position = spectrum.abscissa[4];
        spectrum
            .normalize(Normalization::Peak { position })
            .unwrap();
        assert_eq!(spectrum.intensity[(4, 0)], 1.0);
        assert_eq!(spectrum.intensity[(4, 1)], 1.0);
    }

    #[test]
    fn test_read_value_at_single_only() {
        let mut kinetic = kinetic_fixture();
        assert!(matches!(
            kinetic.read_value_at(410.0),
            Err(VibError::DimensionMismatch(_))
        ));

        let mut single = ir_fixture(UnitState::Absorbance);
        let value = single.read_value_at(single.abscissa[3]).unwrap();
        assert_eq!(value, 10.0);
        assert_eq!(single.summary(), Some(&Summary::Peak(10.0)));
        assert_eq!(single.summary_value().unwrap(), 10.0);
    }

    #[test]
    fn test_trend_requires_summary() {
        let spectrum = kinetic_fixture();
        assert!(matches!(
            spectrum.integral_trace(),
            Err(VibError::MissingDerivedState(_))
        ));
        assert!(matches!(
            spectrum.conversion_trace(),
            Err(VibError::MissingDerivedState(_))
        ));
    }

    #[test]
    fn test_conversion_trace_values() {
        let mut spectrum = kinetic_fixture();
        let (lo, hi) = spectrum.abscissa_range();
        spectrum.integrate(lo, hi).unwrap();
        let trace = spectrum.conversion_trace().unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0], (0.0, 0.0));
        // Column 1 integrates higher than the reference, so conversion
        // goes negative: 1 - I(t)/I(0).
        assert!(trace[1].1 < 0.0);
    }

    #[test]
    fn test_check_comparable() {
        let kinetic = kinetic_fixture();
        let single = ir_fixture(UnitState::Absorbance);
        assert!(matches!(
            kinetic.check_comparable(&single),
            Err(VibError::DimensionMismatch(_))
        ));
        let transmission = ir_fixture(UnitState::Transmission);
        let absorbance = ir_fixture(UnitState::Absorbance);
        assert!(matches!(
            transmission.check_comparable(&absorbance),
            Err(VibError::DimensionMismatch(_))
        ));
        assert!(kinetic.check_comparable(&kinetic_fixture()).is_ok());
    }

    #[test]
    fn test_snapshot_round_trip_is_exact() {
        let mut spectrum = ir_fixture(UnitState::Transmission);
        spectrum.to_absorbance().unwrap();
        spectrum.integrate(spectrum.abscissa[1], spectrum.abscissa[6]).unwrap();
        let bytes = snapshot_to_bytes(&spectrum).unwrap();
        let restored = snapshot_from_bytes(&bytes).unwrap();
        assert_eq!(*restored.abscissa, *spectrum.abscissa);
        assert_eq!(restored.intensity, spectrum.intensity);
        assert_eq!(restored.raw(), spectrum.raw());
        assert_eq!(restored.units, spectrum.units);
        assert_eq!(restored.id(), spectrum.id());
        assert_eq!(restored.summary(), spectrum.summary());
    }

    #[test]
    fn test_snapshot_rejects_short_matrix_block() {
        // Stream claims a 2x2 matrix but carries only two values per block.
        let config = bincode::config::standard();
        let mut bytes = bincode::encode_to_vec(vec![1.0_f64, 2.0], config).unwrap();
        bytes.extend(bincode::encode_to_vec(2_usize, config).unwrap());
        bytes.extend(bincode::encode_to_vec(2_usize, config).unwrap());
        bytes.extend(bincode::encode_to_vec(vec![1.0_f64, 2.0], config).unwrap());
        bytes.extend(bincode::encode_to_vec(vec![1.0_f64, 2.0], config).unwrap());
        bytes.extend(bincode::encode_to_vec(vec![0.0_f64, 30.0], config).unwrap());
        bytes.extend(bincode::encode_to_vec(Option::<UnitState>::None, config).unwrap());
        bytes.extend(bincode::encode_to_vec(String::from("broken"), config).unwrap());
        bytes.extend(bincode::encode_to_vec(0_u128, config).unwrap());
        bytes.extend(bincode::encode_to_vec(Option::<Summary>::None, config).unwrap());

        let err = snapshot_from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, VibError::UnsupportedFormat(_)));
    }

    /// Full data flow: spike removal, baseline, normalization,
    /// integration, conversion trend.
    #[test]
    fn test_kinetic_pipeline_end_to_end() {
        let n = 101;
        let abscissa: Vec<f64> = (0..n).map(|i| 800.0 + 2.0 * i as f64).collect();
        let frames = 4;
        let mut data = Vec::with_capacity(n * frames);
        for t in 0..frames {
            let scale = 1.0 - 0.2 * t as f64;
            for i in 0..n {
                let x = 800.0 + 2.0 * i as f64;
                let band = scale * (-((x - 900.0) / 10.0).powi(2)).exp();
                data.push(band + 0.5);
            }
        }
        let timestamps: Vec<f64> = (0..frames).map(|t| 30.0 * t as f64).collect();
        let mut spectrum = Spectrum::raman(
            abscissa,
            DMatrix::from_vec(n, frames, data),
            timestamps,
            "pipeline",
        )
        .unwrap();

        spectrum.remove_spikes();
        spectrum
            .baseline(BaselineParams::new(0.0, 0.0, 0.5))
            .unwrap();
        spectrum.integrate(850.0, 950.0).unwrap();
        let trace = spectrum.conversion_trace().unwrap();
        assert_eq!(trace.len(), frames);
        assert!((trace[0].1).abs() < 1e-9);
        // The band decays, so conversion rises monotonically.
        for pair in trace.windows(2) {
            assert!(pair[1].1 > pair[0].1);
        }
        // Roughly 20 % of the band disappears per frame.
        assert!((trace[1].1 - 0.2).abs() < 0.05);
    }
}
