//! Asymmetric least squares (Eilers & Boelens, 2005).

use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::whittaker::{reweighted_smooth, ReweightOptions, WeightUpdate};
use super::{BaselineEstimator, FitResult, Method};

/// Penalized smoothing with weight `p` for points above the fit and `1 - p`
/// for points on or below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Als {
    pub asymmetry_param: f64,
    pub smoothness_param: f64,
    pub max_iters: usize,
    pub conv_thresh: f64,
    pub verbose: bool,
}

impl Default for Als {
    fn default() -> Self {
        Self {
            asymmetry_param: 0.05,
            smoothness_param: 1e6,
            max_iters: 10,
            conv_thresh: 1e-5,
            verbose: false,
        }
    }
}

impl Als {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::Als.display_name(), params);
        Self {
            asymmetry_param: r.f64_or("asymmetry_param", d.asymmetry_param),
            smoothness_param: r.f64_or("smoothness_param", d.smoothness_param),
            max_iters: r.usize_or("max_iters", d.max_iters),
            conv_thresh: r.f64_or("conv_thresh", d.conv_thresh),
            verbose: r.bool_or("verbose", d.verbose),
        }
    }
}

struct AsymmetricWeights {
    p: f64,
}

impl AsymmetricWeights {
    fn weight(&self, y: f64, z: f64) -> f64 {
        if y > z {
            self.p
        } else {
            1.0 - self.p
        }
    }
}

impl WeightUpdate for AsymmetricWeights {
    fn name(&self) -> &'static str {
        "ALS"
    }

    /// Euclidean norm of the change the next reweighting would make.
    fn convergence(&self, signal: &[f64], z: &[f64], weights: &[f64]) -> f64 {
        signal
            .iter()
            .zip(z)
            .zip(weights)
            .map(|((&y, &zi), &w)| (self.weight(y, zi) - w).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn reweight(&mut self, _iteration: usize, signal: &[f64], z: &[f64], weights: &mut [f64]) {
        for ((w, &y), &zi) in weights.iter_mut().zip(signal).zip(z) {
            *w = self.weight(y, zi);
        }
    }
}

impl BaselineEstimator for Als {
    fn method(&self) -> Method {
        Method::Als
    }

    fn fit(&self, _wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let opts = ReweightOptions {
            smoothness: self.smoothness_param,
            order: 2,
            max_iters: self.max_iters,
            conv_thresh: self.conv_thresh,
            verbose: self.verbose,
        };
        reweighted_smooth(
            intensities,
            &opts,
            &mut AsymmetricWeights {
                p: self.asymmetry_param,
            },
        )
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("asymmetry_", ParamRange::log(1e-3, 1e-1)),
            ("smoothness_", ParamRange::log(1e2, 1e8)),
        ])
    }
}
