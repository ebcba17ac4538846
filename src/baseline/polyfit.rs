use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, DVector, Dyn};

use super::common::std_dev;
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Upper bound on clipping rounds; each round only ever lowers the signal.
const MAX_ROUNDS: usize = 200;

/// Singular values below this (relative to the largest) are treated as zero.
const SVD_EPS: f64 = 1e-12;

/// Iterative polynomial baseline (Lieber & Mahadevan-Jansen, 2003).
///
/// A polynomial of degree `poly_order` is fitted by least squares. Samples
/// more than `num_stdv` residual standard deviations above the fit are
/// replaced by the fit, and the procedure repeats until no sample is
/// clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFit {
    pub poly_order: usize,
    pub num_stdv: f64,
}

impl Default for PolyFit {
    fn default() -> Self {
        Self {
            poly_order: 5,
            num_stdv: 3.0,
        }
    }
}

impl PolyFit {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::Polyfit.display_name(), params);
        Self {
            poly_order: r.usize_or("poly_order", d.poly_order),
            num_stdv: r.f64_or("num_stdv", d.num_stdv),
        }
    }
}

/// Least-squares polynomial fit on a fixed abscissa.
struct PolyBasis {
    vandermonde: DMatrix<f64>,
    svd: SVD<f64, Dyn, Dyn>,
    tolerance: f64,
}

impl PolyBasis {
    /// Columns `1, t, t², …` with `x` mapped onto `[-1, 1]` for conditioning.
    fn new(x: &[f64], order: usize) -> Self {
        let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = hi - lo;
        let t: Vec<f64> = x
            .iter()
            .map(|v| if span > 0.0 { 2.0 * (v - lo) / span - 1.0 } else { 0.0 })
            .collect();
        let vandermonde = DMatrix::from_fn(x.len(), order + 1, |r, c| t[r].powi(c as i32));
        let svd = vandermonde.clone().svd(true, true);
        let tolerance = SVD_EPS * svd.singular_values.max();
        Self {
            vandermonde,
            svd,
            tolerance,
        }
    }

    fn fit(&self, y: &[f64]) -> Option<Vec<f64>> {
        let b = DVector::from_column_slice(y);
        let coeffs = self.svd.solve(&b, self.tolerance).ok()?;
        Some((&self.vandermonde * coeffs).iter().copied().collect())
    }
}

impl BaselineEstimator for PolyFit {
    fn method(&self) -> Method {
        Method::Polyfit
    }

    fn fit(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let n = intensities.len();
        if n == 0 {
            return FitResult::new(Vec::new());
        }
        let basis = PolyBasis::new(wavelengths, self.poly_order.min(n - 1));
        let mut clipped = intensities.to_vec();
        let mut rounds = 0;
        let mut converged = false;

        while rounds < MAX_ROUNDS {
            rounds += 1;
            let Some(fit) = basis.fit(&clipped) else {
                log::warn!("Polyfit: least-squares solve failed in round {rounds}");
                break;
            };
            let residual: Vec<f64> = clipped.iter().zip(&fit).map(|(y, f)| y - f).collect();
            let cutoff = self.num_stdv * std_dev(&residual);

            let mut any_clipped = false;
            for ((y, f), r) in clipped.iter_mut().zip(&fit).zip(&residual) {
                if *r > cutoff {
                    *y = *f;
                    any_clipped = true;
                }
            }
            if !any_clipped {
                converged = true;
                break;
            }
        }
        if !converged {
            log::debug!("Polyfit: still clipping after {rounds} rounds");
        }

        let baseline = basis.fit(&clipped).unwrap_or(clipped);
        FitResult {
            baseline,
            iterations: Some(rounds),
            converged: Some(converged),
            ..FitResult::default()
        }
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("poly_order_", ParamRange::integer(1.0, 12.0)),
            ("stdv_", ParamRange::linear(1.0, 5.0)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exact_polynomial_is_reproduced() {
        let x: Vec<f64> = (0..100).map(|i| 400.0 + 2.5 * i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|v| {
                let t = (v - 400.0) / 100.0;
                3.0 - 2.0 * t + 0.5 * t * t
            })
            .collect();
        let fit = PolyFit {
            poly_order: 2,
            num_stdv: 3.0,
        }
        .fit(&x, &y);
        for (b, v) in fit.baseline.iter().zip(&y) {
            assert_abs_diff_eq!(b, v, epsilon = 1e-8);
        }
    }

    #[test]
    fn peak_is_clipped_away() {
        let n = 300;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|v| 100.0 + 0.1 * v + 500.0 * (-((v - 150.0) / 3.0).powi(2)).exp())
            .collect();
        let fit = PolyFit {
            poly_order: 1,
            num_stdv: 2.0,
        }
        .fit(&x, &y);
        assert_abs_diff_eq!(fit.baseline[150], 115.0, epsilon = 1.0);
        assert!(fit.iterations.unwrap() > 1);
    }

    #[test]
    fn order_is_capped_by_the_sample_count() {
        let fit = PolyFit::default().fit(&[1.0, 2.0, 3.0], &[4.0, 6.0, 5.0]);
        assert_eq!(fit.baseline.len(), 3);
        assert!(fit.baseline.iter().all(|b| b.is_finite()));
    }

    #[test]
    fn declared_ranges() {
        let r = PolyFit::default().param_ranges();
        assert_eq!(r["poly_order_"].as_tuple(), (1.0, 12.0, crate::ScaleKind::Integer));
        assert_eq!(r["stdv_"].as_tuple(), (1.0, 5.0, crate::ScaleKind::Linear));
    }
}
