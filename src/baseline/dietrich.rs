//! Dietrich, Rüdel & Gaab, "Fast and precise automatic baseline correction
//! of one- and two-dimensional NMR spectra" (1991).

use super::common::iterative_threshold;
use super::interp::linear;
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Baseline points are found where the smoothed spectrum is flat; peak
/// tops that slip through are removed by binary erosion, and the baseline
/// is the linear interpolation through what remains.
#[derive(Debug, Clone, PartialEq)]
pub struct Dietrich {
    pub half_window: usize,
    pub num_erosions: usize,
}

impl Default for Dietrich {
    fn default() -> Self {
        Self {
            half_window: 16,
            num_erosions: 10,
        }
    }
}

impl Dietrich {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::Dietrich.display_name(), params);
        Self {
            half_window: r.usize_or("half_window", d.half_window),
            num_erosions: r.usize_or("num_erosions", d.num_erosions),
        }
    }

    /// Mask of samples classified as baseline.
    pub fn baseline_mask(&self, intensities: &[f64]) -> Vec<bool> {
        let n = intensities.len();
        let hw = self.half_window;
        if n < 2 {
            return vec![true; n];
        }

        // moving average over the interior, edges left as measured
        let mut smoothed = intensities.to_vec();
        let width = 2 * hw + 1;
        if n >= width {
            let mut sum: f64 = intensities[..width].iter().sum();
            for centre in hw..n - hw {
                if centre > hw {
                    sum += intensities[centre + hw] - intensities[centre - hw - 1];
                }
                smoothed[centre] = sum / width as f64;
            }
        }

        let power: Vec<f64> = smoothed.windows(2).map(|w| (w[1] - w[0]).powi(2)).collect();
        let mut mask = Vec::with_capacity(n);
        mask.push(true);
        mask.extend(iterative_threshold(&power, 3.0));

        erode(&mut mask, hw, self.num_erosions);
        mask
    }
}

/// Binary erosion with a 3-sample structuring element, applied `iterations`
/// times but only to samples in `margin..n - margin`. Samples outside the
/// array count as non-baseline.
fn erode(mask: &mut [bool], margin: usize, iterations: usize) {
    let n = mask.len();
    let end = n.saturating_sub(margin);
    if margin >= end {
        return;
    }
    for _ in 0..iterations {
        let prev = mask.to_vec();
        let mut changed = false;
        for i in margin..end {
            let left = i > 0 && prev[i - 1];
            let right = i + 1 < n && prev[i + 1];
            let keep = prev[i] && left && right;
            if keep != prev[i] {
                changed = true;
            }
            mask[i] = keep;
        }
        if !changed {
            break;
        }
    }
}

impl BaselineEstimator for Dietrich {
    fn method(&self) -> Method {
        Method::Dietrich
    }

    fn fit(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let mask = self.baseline_mask(intensities);
        let (xp, fp): (Vec<f64>, Vec<f64>) = wavelengths
            .iter()
            .zip(intensities)
            .zip(&mask)
            .filter_map(|((&x, &y), &keep)| keep.then_some((x, y)))
            .unzip();
        if xp.is_empty() {
            return FitResult::new(intensities.to_vec());
        }
        FitResult::new(linear(&xp, &fp, wavelengths))
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("half_window_", ParamRange::integer(1.0, 100.0)),
            ("num_erosions_", ParamRange::integer(1.0, 20.0)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn erosion_shrinks_runs_inside_the_margin() {
        let mut mask = vec![true, true, false, true, true, true, true, false, true, true];
        erode(&mut mask, 1, 1);
        assert_eq!(
            mask,
            vec![true, false, false, false, true, true, false, false, false, true]
        );
    }

    #[test]
    fn samples_past_the_ends_are_not_baseline() {
        let mut mask = vec![true; 6];
        erode(&mut mask, 0, 1);
        assert_eq!(mask, vec![false, true, true, true, true, false]);
    }

    #[test]
    fn flat_spectrum_is_all_baseline() {
        let y = vec![7.0; 64];
        let x: Vec<f64> = (0..64).map(|i| i as f64).collect();
        let est = Dietrich {
            half_window: 4,
            num_erosions: 3,
        };
        assert!(est.baseline_mask(&y).iter().all(|m| *m));
        assert_eq!(est.fit(&x, &y).baseline, y);
    }

    #[test]
    fn peak_is_excluded_and_bridged() {
        let n = 256;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|v| 100.0 + 0.2 * v + 500.0 * (-((v - 128.0) / 6.0).powi(2)).exp())
            .collect();
        let est = Dietrich {
            half_window: 3,
            num_erosions: 4,
        };
        let mask = est.baseline_mask(&y);
        assert!(!mask[128]);
        let fit = est.fit(&x, &y);
        assert_abs_diff_eq!(fit.baseline[128], 100.0 + 0.2 * 128.0, epsilon = 5.0);
    }
}
