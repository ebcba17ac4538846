//! Kajfosz & Kwiatek, "Non-polynomial approximation of background in X-ray
//! spectra" (1987).

use super::common::{nan_max, nan_min};
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Background as the upper envelope of a rolled clipping shape.
///
/// The shape is flat for `top_width` samples on either side of its apex and
/// then falls off as `A·((|d| - top_width) / bottom_width)^exponent`, where
/// `A` is the peak-to-peak amplitude of the spectrum. At every sample the
/// shape is lowered until it touches the spectrum from below; the baseline
/// is the highest shape covering each point.
///
/// With `tangent` the shape is tilted to follow the local slope of the
/// spectrum, which keeps sloped backgrounds from being clipped.
///
/// `bottom_width = 0` leaves the fall-off undefined; the baseline is then NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct KajfoszKwiatek {
    pub top_width: usize,
    pub bottom_width: usize,
    pub exponent: f64,
    pub tangent: bool,
}

impl Default for KajfoszKwiatek {
    fn default() -> Self {
        Self {
            top_width: 0,
            bottom_width: 50,
            exponent: 2.0,
            tangent: false,
        }
    }
}

impl KajfoszKwiatek {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::Kk.display_name(), params);
        Self {
            top_width: r.usize_or("top_width", d.top_width),
            bottom_width: r.usize_or("bottom_width", d.bottom_width),
            exponent: r.f64_or("exponent", d.exponent),
            tangent: r.bool_or("tangent", d.tangent),
        }
    }

    fn shape(&self, amplitude: f64, offset: isize) -> f64 {
        let past_top = (offset.unsigned_abs() as f64 - self.top_width as f64).max(0.0);
        amplitude * (past_top / self.bottom_width as f64).powf(self.exponent)
    }

    fn slope(&self, y: &[f64], j: usize) -> f64 {
        if !self.tangent {
            return 0.0;
        }
        let n = y.len();
        let reach = self.top_width.max(1);
        let lo = j.saturating_sub(reach);
        let hi = (j + reach).min(n - 1);
        if hi == lo {
            return 0.0;
        }
        (y[hi] - y[lo]) / (hi - lo) as f64
    }
}

impl BaselineEstimator for KajfoszKwiatek {
    fn method(&self) -> Method {
        Method::Kk
    }

    fn fit(&self, _wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let y = intensities;
        let n = y.len();
        if n == 0 {
            return FitResult::new(Vec::new());
        }
        let amplitude = y.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            - y.iter().copied().fold(f64::INFINITY, f64::min);
        let reach = self.top_width + self.bottom_width;
        let window = |j: usize| j.saturating_sub(reach)..=(j + reach).min(n - 1);

        let slopes: Vec<f64> = (0..n).map(|j| self.slope(y, j)).collect();

        // lowest apex height at which the shape centred on j stays under y
        let apex: Vec<f64> = (0..n)
            .map(|j| {
                window(j).fold(f64::INFINITY, |h, k| {
                    let d = k as isize - j as isize;
                    nan_min(h, y[k] - slopes[j] * d as f64 + self.shape(amplitude, d))
                })
            })
            .collect();

        let baseline = (0..n)
            .map(|i| {
                window(i).fold(f64::NEG_INFINITY, |b, j| {
                    let d = i as isize - j as isize;
                    nan_max(b, apex[j] + slopes[j] * d as f64 - self.shape(amplitude, d))
                })
            })
            .collect();

        FitResult::new(baseline)
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("top_width_", ParamRange::integer(0.0, 100.0)),
            ("bottom_width_", ParamRange::integer(0.0, 100.0)),
        ])
    }
}
