//! Baseline estimators and the machinery they share.
//!
//! Architecture:
//! ```text
//!   Params ──▶ Method::build ──▶ Box<dyn BaselineEstimator>
//!                                        │
//!                   fit / fit_transform  │  (optionally per segment)
//!                                        ▼
//!   ┌────────────┐   ┌─────────────┐   ┌──────────────────┐
//!   │  segment   │   │   interp    │   │    whittaker     │
//!   │ gap split  │   │ lin / cubic │   │ banded PLS core  │
//!   └────────────┘   └─────────────┘   └──────────────────┘
//! ```
pub mod airpls;
pub mod als;
pub mod common;
pub mod dietrich;
pub mod fabc;
pub mod interp;
pub mod kajfosz_kwiatek;
pub mod median;
pub mod mininterp;
pub mod params;
pub mod polyfit;
pub mod registry;
pub mod rubberband;
pub mod segment;
pub mod wavelet;
pub mod whittaker;

use ndarray::{aview1, Array2, ArrayView2, Axis};
use rayon::prelude::*;

pub use params::{params, ParamRange, ParamRanges, ParamValue, Params, ScaleKind};
pub use registry::Method;
pub use segment::{segments, segments_with_threshold, Segment, Segments, DEFAULT_GAP_THRESHOLD};

// ---------------------------------------------------------------------------
// FitResult – output of a single-spectrum fit
// ---------------------------------------------------------------------------

/// Baseline of one spectrum, plus optional diagnostics.
///
/// Only `baseline` is relied upon by the dispatcher; the remaining fields are
/// filled in by the iterative estimators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitResult {
    pub baseline: Vec<f64>,
    /// Final per-point weights of a reweighted fit.
    pub weights: Option<Vec<f64>>,
    /// Number of smoothing passes performed.
    pub iterations: Option<usize>,
    /// Whether the convergence threshold was reached before `max_iters`.
    pub converged: Option<bool>,
}

impl FitResult {
    pub fn new(baseline: Vec<f64>) -> Self {
        Self {
            baseline,
            ..Default::default()
        }
    }

    /// `intensities - baseline`, element-wise.
    pub fn corrected(&self, intensities: &[f64]) -> Vec<f64> {
        intensities
            .iter()
            .zip(&self.baseline)
            .map(|(y, b)| y - b)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// BaselineEstimator – the shared capability
// ---------------------------------------------------------------------------

/// One baseline-estimation algorithm, configured at construction.
///
/// Estimators hold only their parameters, so `fit` is a pure function of its
/// arguments and an estimator can be shared freely across threads.
pub trait BaselineEstimator: Send + Sync {
    /// Registry entry this estimator was built from.
    fn method(&self) -> Method;

    /// Estimate the baseline of one spectrum.
    ///
    /// `wavelengths` and `intensities` must have the same length.
    fn fit(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult;

    /// Recommended tuning domain of each parameter.
    fn param_ranges(&self) -> ParamRanges;

    /// Baselines of every row of `spectra` (rows = spectra, columns =
    /// `wavelengths`). Equivalent to calling [`fit`](Self::fit) on each row.
    fn fit_transform(&self, wavelengths: &[f64], spectra: ArrayView2<'_, f64>) -> Array2<f64> {
        fit_rows(spectra, |row| self.fit(wavelengths, row).baseline)
    }

    /// Like [`fit`](Self::fit), but each gap-free run of the wavelength axis
    /// is fitted on its own and the pieces are concatenated.
    fn fit_segmented(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let n = intensities.len();
        let grid = aview1(intensities).insert_axis(Axis(0));
        let mut baseline = Vec::with_capacity(n);
        for seg in segments(wavelengths, grid) {
            let row = seg.spectra.row(0).to_vec();
            baseline.extend(self.fit(seg.wavelengths, &row).baseline);
        }
        FitResult::new(baseline)
    }

    /// Row-wise [`fit_segmented`](Self::fit_segmented).
    fn fit_transform_segmented(
        &self,
        wavelengths: &[f64],
        spectra: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        fit_rows(spectra, |row| self.fit_segmented(wavelengths, row).baseline)
    }
}

/// Apply `fit_one` to every row in parallel and stack the results.
fn fit_rows<F>(spectra: ArrayView2<'_, f64>, fit_one: F) -> Array2<f64>
where
    F: Fn(&[f64]) -> Vec<f64> + Sync,
{
    let (rows, cols) = spectra.dim();
    let fitted: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|i| {
            let row = spectra.index_axis(Axis(0), i).to_vec();
            fit_one(&row)
        })
        .collect();

    let mut out = Array2::zeros((rows, cols));
    for (mut dst, src) in out.outer_iter_mut().zip(fitted) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = s;
        }
    }
    out
}
