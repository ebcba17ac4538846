//! Fully automatic baseline correction (Cobas et al., 2006).

use super::common::{iterative_threshold, reflect_index};
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::whittaker::WhittakerSmoother;
use super::{BaselineEstimator, FitResult, Method};

/// Half-width, in samples, of the Haar wavelet used as a derivative filter.
const WAVELET_HALF_WIDTH: usize = 10;

/// FABC: classify samples as baseline where a wavelet derivative of the
/// spectrum is small, widen the excluded peak regions by `dilation_param`
/// samples, and smooth the baseline samples with a first-order Whittaker
/// penalty of strength `smoothness_param`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fabc {
    pub dilation_param: usize,
    pub smoothness_param: f64,
}

impl Default for Fabc {
    fn default() -> Self {
        Self {
            dilation_param: 50,
            smoothness_param: 1e3,
        }
    }
}

impl Fabc {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::Fabc.display_name(), params);
        Self {
            dilation_param: r.usize_or("dilation_param", d.dilation_param),
            smoothness_param: r.f64_or("smoothness_param", d.smoothness_param),
        }
    }

    /// Mask of samples treated as baseline.
    pub fn baseline_mask(&self, intensities: &[f64]) -> Vec<bool> {
        let derivative: Vec<f64> = haar_derivative(intensities, WAVELET_HALF_WIDTH)
            .into_iter()
            .map(f64::abs)
            .collect();
        let quiet = iterative_threshold(&derivative, 3.0);
        dilate_false(&quiet, self.dilation_param)
    }
}

/// Haar wavelet coefficients at one scale: mean of the `half` samples after
/// each point minus the mean of the `half` samples up to and including it.
fn haar_derivative(signal: &[f64], half: usize) -> Vec<f64> {
    let n = signal.len();
    let half = half.max(1);
    let at = |i: isize| signal[reflect_index(i, n)];
    (0..n as isize)
        .map(|i| {
            let ahead: f64 = (1..=half as isize).map(|k| at(i + k)).sum();
            let behind: f64 = (0..half as isize).map(|k| at(i - k)).sum();
            (ahead - behind) / half as f64
        })
        .collect()
}

/// Clear every sample within `radius` of a `false` sample.
fn dilate_false(mask: &[bool], radius: usize) -> Vec<bool> {
    let n = mask.len();
    let mut out = mask.to_vec();
    if radius == 0 {
        return out;
    }
    // distance to the nearest false sample on the left, then on the right
    let mut since = usize::MAX;
    for i in 0..n {
        since = if mask[i] { since.saturating_add(1) } else { 0 };
        if since <= radius {
            out[i] = false;
        }
    }
    since = usize::MAX;
    for i in (0..n).rev() {
        since = if mask[i] { since.saturating_add(1) } else { 0 };
        if since <= radius {
            out[i] = false;
        }
    }
    out
}

impl BaselineEstimator for Fabc {
    fn method(&self) -> Method {
        Method::Fabc
    }

    fn fit(&self, _wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let mask = self.baseline_mask(intensities);
        let mut weights: Vec<f64> = mask.iter().map(|&m| f64::from(u8::from(m))).collect();
        if !mask.iter().any(|m| *m) {
            log::debug!("FABC: no baseline samples found, smoothing the whole spectrum");
            weights.fill(1.0);
        }
        let smoother = WhittakerSmoother::new(intensities, self.smoothness_param, 1);
        FitResult {
            baseline: smoother.smooth(&weights),
            weights: Some(weights),
            ..FitResult::default()
        }
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("dilation_", ParamRange::integer(1.0, 100.0)),
            ("smoothness_", ParamRange::log(1.0, 1e6)),
        ])
    }
}
