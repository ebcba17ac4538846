//! Adaptive iteratively reweighted penalized least squares (Zhang et al., 2010).

use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::whittaker::{reweighted_smooth, ReweightOptions, WeightUpdate};
use super::{BaselineEstimator, FitResult, Method};

/// airPLS: points above the current fit get zero weight, points below get
/// a weight that grows exponentially with their share of the total
/// below-fit residual and with the iteration number.
#[derive(Debug, Clone, PartialEq)]
pub struct AirPls {
    pub smoothness_param: f64,
    pub conv_thresh: f64,
    pub max_iters: usize,
    pub verbose: bool,
}

impl Default for AirPls {
    fn default() -> Self {
        Self {
            smoothness_param: 100.0,
            conv_thresh: 1e-3,
            max_iters: 10,
            verbose: false,
        }
    }
}

impl AirPls {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::AirPls.display_name(), params);
        Self {
            smoothness_param: r.f64_or("smoothness_param", d.smoothness_param),
            conv_thresh: r.f64_or("conv_thresh", d.conv_thresh),
            max_iters: r.usize_or("max_iters", d.max_iters),
            verbose: r.bool_or("verbose", d.verbose),
        }
    }
}

struct AdaptiveWeights {
    /// `Σ|y|`, the scale of the convergence ratio.
    total_intensity: f64,
}

impl WeightUpdate for AdaptiveWeights {
    fn name(&self) -> &'static str {
        "airPLS"
    }

    /// Total distance of the signal below the fit, as a fraction of `Σ|y|`.
    fn convergence(&self, signal: &[f64], z: &[f64], _weights: &[f64]) -> f64 {
        let below: f64 = signal
            .iter()
            .zip(z)
            .map(|(y, zi)| y - zi)
            .filter(|d| *d < 0.0)
            .map(|d| -d)
            .sum();
        if self.total_intensity == 0.0 {
            return 0.0;
        }
        below / self.total_intensity
    }

    fn reweight(&mut self, iteration: usize, signal: &[f64], z: &[f64], weights: &mut [f64]) {
        let n = signal.len();
        if n == 0 {
            return;
        }
        let residual: Vec<f64> = signal.iter().zip(z).map(|(y, zi)| y - zi).collect();
        let total_error: f64 = residual.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
        let scale = iteration as f64;

        let mut max_share = f64::NEG_INFINITY;
        for (w, d) in weights.iter_mut().zip(&residual) {
            if *d < 0.0 {
                let share = -d / total_error;
                max_share = max_share.max(share);
                *w = (scale * share).exp();
            } else {
                *w = 0.0;
            }
        }
        // the endpoints anchor the fit even when they sit on a peak
        let edge = (scale * max_share).exp();
        weights[0] = edge;
        weights[n - 1] = edge;
    }
}

impl BaselineEstimator for AirPls {
    fn method(&self) -> Method {
        Method::AirPls
    }

    fn fit(&self, _wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let opts = ReweightOptions {
            smoothness: self.smoothness_param,
            order: 2,
            max_iters: self.max_iters,
            conv_thresh: self.conv_thresh,
            verbose: self.verbose,
        };
        let mut rule = AdaptiveWeights {
            total_intensity: intensities.iter().map(|y| y.abs()).sum(),
        };
        reweighted_smooth(intensities, &opts, &mut rule)
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([("smoothness_", ParamRange::log(1.0, 1e4))])
    }
}
