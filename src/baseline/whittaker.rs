//! Penalized least-squares (Whittaker) smoothing and the reweighting loop
//! built on it.
//!
//! The smoother solves
//!
//! ```text
//! (W + λ·DᵀD) z = W y
//! ```
//!
//! where `W = diag(w)` and `D` is the order-`d` difference operator. The
//! system matrix is symmetric positive definite with half-bandwidth `d`, so
//! it is stored as its lower band and factored by banded Cholesky in
//! `O(n·d²)`.

use super::FitResult;

// ---------------------------------------------------------------------------
// WhittakerSmoother
// ---------------------------------------------------------------------------

/// Weighted smoother for one signal with a fixed penalty.
#[derive(Debug, Clone)]
pub struct WhittakerSmoother<'a> {
    signal: &'a [f64],
    order: usize,
    /// `band[i * (order + 1) + k]` holds `λ·(DᵀD)[i][i - k]`.
    penalty_band: Vec<f64>,
}

impl<'a> WhittakerSmoother<'a> {
    /// Precompute `λ·DᵀD` for `signal`. `order` is the difference order
    /// (1 penalises slope, 2 penalises curvature) and must be at least 1.
    pub fn new(signal: &'a [f64], smoothness: f64, order: usize) -> Self {
        let order = order.max(1);
        let n = signal.len();
        let stencil = difference_stencil(order);
        let width = order + 1;
        let mut penalty_band = vec![0.0; n * width];

        // each row r of D touches columns r..=r+order
        for r in 0..n.saturating_sub(order) {
            for a in 0..=order {
                for b in 0..=a {
                    penalty_band[(r + a) * width + (a - b)] += smoothness * stencil[a] * stencil[b];
                }
            }
        }

        Self {
            signal,
            order,
            penalty_band,
        }
    }

    /// Solve for the smoothed signal under per-point `weights`.
    ///
    /// With too few positive weights the system is singular and the result
    /// contains NaN.
    pub fn smooth(&self, weights: &[f64]) -> Vec<f64> {
        let n = self.signal.len();
        let width = self.order + 1;
        let mut band = self.penalty_band.clone();
        for i in 0..n {
            band[i * width] += weights[i];
        }
        let rhs: Vec<f64> = weights.iter().zip(self.signal).map(|(w, y)| w * y).collect();
        banded_cholesky_solve(&mut band, self.order, rhs)
    }
}

/// Coefficients of the order-`d` forward difference, e.g. `[1, -2, 1]`.
fn difference_stencil(order: usize) -> Vec<f64> {
    let mut stencil = vec![1.0];
    for _ in 0..order {
        let mut next = vec![0.0; stencil.len() + 1];
        for (i, c) in stencil.iter().enumerate() {
            next[i] -= c;
            next[i + 1] += c;
        }
        stencil = next;
    }
    stencil
}

/// Solve `A x = b` for symmetric positive definite `A` given by its lower
/// band (`band[i * (p + 1) + k] = A[i][i - k]`). The band is overwritten by
/// the Cholesky factor.
fn banded_cholesky_solve(band: &mut [f64], p: usize, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    let width = p + 1;

    for i in 0..n {
        for j in i.saturating_sub(p)..=i {
            let mut sum = band[i * width + (i - j)];
            for k in i.saturating_sub(p)..j {
                sum -= band[i * width + (i - k)] * band[j * width + (j - k)];
            }
            if i == j {
                band[i * width] = sum.sqrt();
            } else {
                band[i * width + (i - j)] = sum / band[j * width];
            }
        }
    }

    // L y = b
    for i in 0..n {
        let mut sum = b[i];
        for k in i.saturating_sub(p)..i {
            sum -= band[i * width + (i - k)] * b[k];
        }
        b[i] = sum / band[i * width];
    }
    // Lᵀ x = y
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in i + 1..(i + width).min(n) {
            sum -= band[k * width + (k - i)] * b[k];
        }
        b[i] = sum / band[i * width];
    }
    b
}

// ---------------------------------------------------------------------------
// Reweighted smoothing loop
// ---------------------------------------------------------------------------

/// How an iteratively reweighted estimator scores and updates its weights.
pub trait WeightUpdate {
    /// Display name used in log lines.
    fn name(&self) -> &'static str;

    /// Convergence metric of the current fit `z`; the loop stops once it
    /// drops below the threshold.
    fn convergence(&self, signal: &[f64], z: &[f64], weights: &[f64]) -> f64;

    /// Update `weights` in place for the next pass (`iteration` is 1-based).
    fn reweight(&mut self, iteration: usize, signal: &[f64], z: &[f64], weights: &mut [f64]);
}

/// Options of the reweighting loop shared by AirPLS and ALS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReweightOptions {
    pub smoothness: f64,
    pub order: usize,
    pub max_iters: usize,
    pub conv_thresh: f64,
    pub verbose: bool,
}

/// Alternate smoothing and reweighting until `rule` reports convergence or
/// `max_iters` passes have run. Non-convergence returns the last iterate.
pub fn reweighted_smooth<R: WeightUpdate>(
    signal: &[f64],
    opts: &ReweightOptions,
    rule: &mut R,
) -> FitResult {
    let smoother = WhittakerSmoother::new(signal, opts.smoothness, opts.order);
    let mut weights = vec![1.0; signal.len()];
    let mut z: Option<Vec<f64>> = None;
    let mut converged = false;
    let mut iterations = 0;

    for i in 1..=opts.max_iters {
        let fit = smoother.smooth(&weights);
        iterations = i;
        let conv = rule.convergence(signal, &fit, &weights);
        if opts.verbose {
            log::info!("{}: iteration {i}, convergence {conv:e}", rule.name());
        } else {
            log::debug!("{}: iteration {i}, convergence {conv:e}", rule.name());
        }
        if conv < opts.conv_thresh {
            converged = true;
            z = Some(fit);
            break;
        }
        // the returned weights are the ones behind the returned baseline
        if i < opts.max_iters {
            rule.reweight(i, signal, &fit, &mut weights);
        }
        z = Some(fit);
    }

    if !converged {
        log::warn!("{} did not converge in {} iterations", rule.name(), opts.max_iters);
    }

    let baseline = z.unwrap_or_else(|| smoother.smooth(&weights));
    FitResult {
        baseline,
        weights: Some(weights),
        iterations: Some(iterations),
        converged: Some(converged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Dense `(W + λ DᵀD)` for cross-checking the band assembly.
    fn dense_system(n: usize, smoothness: f64, order: usize, w: &[f64]) -> Vec<Vec<f64>> {
        let stencil = difference_stencil(order);
        let mut a = vec![vec![0.0; n]; n];
        for r in 0..n - order {
            for (i, ci) in stencil.iter().enumerate() {
                for (j, cj) in stencil.iter().enumerate() {
                    a[r + i][r + j] += smoothness * ci * cj;
                }
            }
        }
        for i in 0..n {
            a[i][i] += w[i];
        }
        a
    }

    #[test]
    fn stencils_are_binomial_differences() {
        assert_eq!(difference_stencil(1), vec![-1.0, 1.0]);
        assert_eq!(difference_stencil(2), vec![1.0, -2.0, 1.0]);
    }

    #[test]
    fn smooth_solves_the_penalized_system() {
        let y = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let w = [1.0, 0.5, 1.0, 0.0, 1.0, 0.2, 1.0, 1.0];
        for order in [1, 2] {
            let z = WhittakerSmoother::new(&y, 7.5, order).smooth(&w);
            let a = dense_system(y.len(), 7.5, order, &w);
            for i in 0..y.len() {
                let lhs: f64 = (0..y.len()).map(|j| a[i][j] * z[j]).sum();
                assert_abs_diff_eq!(lhs, w[i] * y[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn lines_are_in_the_second_difference_null_space() {
        let y: Vec<f64> = (0..50).map(|i| 10.0 + 0.3 * i as f64).collect();
        let z = WhittakerSmoother::new(&y, 1e4, 2).smooth(&vec![1.0; 50]);
        for (a, b) in z.iter().zip(&y) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    struct Never;

    impl WeightUpdate for Never {
        fn name(&self) -> &'static str {
            "never"
        }
        fn convergence(&self, _: &[f64], _: &[f64], _: &[f64]) -> f64 {
            f64::INFINITY
        }
        fn reweight(&mut self, _: usize, _: &[f64], _: &[f64], weights: &mut [f64]) {
            weights[0] *= 0.5;
        }
    }

    #[test]
    fn non_convergence_returns_last_iterate() {
        let y = [1.0, 5.0, 2.0, 8.0, 3.0];
        let opts = ReweightOptions {
            smoothness: 1.0,
            order: 2,
            max_iters: 3,
            conv_thresh: 1e-3,
            verbose: false,
        };
        let fit = reweighted_smooth(&y, &opts, &mut Never);
        assert_eq!(fit.iterations, Some(3));
        assert_eq!(fit.converged, Some(false));
        // three smoothings with two halvings between them
        let last_weights = vec![0.25, 1.0, 1.0, 1.0, 1.0];
        let expected = WhittakerSmoother::new(&y, 1.0, 2).smooth(&last_weights);
        assert_eq!(fit.baseline, expected);
        assert_eq!(fit.weights, Some(last_weights));
    }

    #[test]
    fn zero_iterations_still_smooths_once() {
        let y = [1.0, 5.0, 2.0, 8.0, 3.0];
        let opts = ReweightOptions {
            smoothness: 1.0,
            order: 2,
            max_iters: 0,
            conv_thresh: 1e-3,
            verbose: true,
        };
        let fit = reweighted_smooth(&y, &opts, &mut Never);
        assert_eq!(fit.baseline.len(), 5);
        assert_eq!(fit.iterations, Some(0));
        assert_eq!(fit.weights, Some(vec![1.0; 5]));
    }
}
