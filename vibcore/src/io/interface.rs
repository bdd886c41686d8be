//! Collaborator seams: loading, persistence, interactive parameter
//! discovery and trend rendering all live outside the core. The core
//! only defines the hand-off types and traits, plus the snapshot codec a
//! persistence collaborator needs. All calls are blocking and
//! synchronous; a picker that is closed without confirming simply
//! returns the defaults it was given.

use nalgebra::DMatrix;

use crate::algorithm::baseline::BaselineParams;
use crate::data::spectrum::{Spectrum, UnitState};
use crate::error::VibError;

/// Hand-off tuple produced by a loader collaborator (vendor file parser
/// or snapshot reader). [`Spectrum::from_raw`] validates and adopts it.
#[derive(Debug, Clone)]
pub struct RawSpectrum {
    pub abscissa: Vec<f64>,
    pub intensity: DMatrix<f64>,
    pub timestamps: Vec<f64>,
    pub units: Option<UnitState>,
    pub label: String,
}

/// Produces raw spectra from some external representation. Loader
/// failures use the reserved `FileNotFound` / `UnsupportedFormat`
/// error kinds.
pub trait SpectrumSource {
    fn load(&mut self) -> Result<RawSpectrum, VibError>;
}

/// Persists spectra. The snapshot form must round-trip `abscissa` and
/// `intensity` exactly (see [`snapshot_to_bytes`]); the tabular text
/// form is not required to preserve the raw-data snapshot.
pub trait SpectrumSink {
    fn write_snapshot(&mut self, spectrum: &Spectrum) -> Result<(), VibError>;
    fn write_table(&mut self, spectrum: &Spectrum) -> Result<(), VibError>;
}

/// Interactive parameter discovery (typically a plot window the operator
/// drags handles on). Opaque to the core: each method blocks until the
/// operator is done and returns the same scalar types the
/// non-interactive call sites take. Cancellation has no distinct signal;
/// an implementation returns the supplied defaults unchanged.
pub trait ParameterPicker {
    fn pick_baseline(
        &mut self,
        abscissa: &[f64],
        intensity: &DMatrix<f64>,
        defaults: BaselineParams,
    ) -> BaselineParams;

    fn pick_region(
        &mut self,
        abscissa: &[f64],
        intensity: &DMatrix<f64>,
        defaults: (f64, f64),
    ) -> (f64, f64);

    fn pick_position(&mut self, abscissa: &[f64], intensity: &DMatrix<f64>, default: f64) -> f64;
}

/// Which derived trend to hand to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendKind {
    /// Band integral against time.
    Integral,
    /// `1 - I(t)/I(0)` against time.
    Conversion,
}

/// One labelled trace of `(time, value)` points, ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Chart-drawing collaborator. Pure consumer: it never mutates spectra.
pub trait TrendRenderer {
    fn render_trend(&mut self, series: &[TrendSeries]) -> Result<(), VibError>;
}

/// Validated entry point for kinetic trend rendering. Every spectrum
/// must be kinetic, carry an integral summary and be mutually comparable,
/// all checked before the renderer is invoked, so a collaborator never
/// sees a half-valid request.
pub fn render_trend(
    spectra: &[&Spectrum],
    kind: TrendKind,
    renderer: &mut dyn TrendRenderer,
) -> Result<(), VibError> {
    let Some((first, rest)) = spectra.split_first() else {
        return Err(VibError::DimensionMismatch("no spectra to render".into()));
    };
    for other in rest {
        first.check_comparable(other)?;
    }
    let mut series = Vec::with_capacity(spectra.len());
    for spectrum in spectra {
        let points = match kind {
            TrendKind::Integral => spectrum.integral_trace()?,
            TrendKind::Conversion => spectrum.conversion_trace()?,
        };
        series.push(TrendSeries {
            label: spectrum.label.clone(),
            points,
        });
    }
    renderer.render_trend(&series)
}

/// Encodes a spectrum snapshot, `raw` copy and provenance tag included.
pub fn snapshot_to_bytes(spectrum: &Spectrum) -> Result<Vec<u8>, VibError> {
    bincode::encode_to_vec(spectrum, bincode::config::standard())
        .map_err(|e| VibError::UnsupportedFormat(format!("snapshot encoding failed: {e}")))
}

/// Restores a spectrum from a snapshot produced by [`snapshot_to_bytes`].
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Spectrum, VibError> {
    let (spectrum, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| VibError::UnsupportedFormat(format!("snapshot decoding failed: {e}")))?;
    Ok(spectrum)
}
