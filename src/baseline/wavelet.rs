use super::common::reflect_index;
use super::interp::CubicSpline;
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Cubic B-spline scaling filter of the à trous transform.
const B3_KERNEL: [f64; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Undecimated ("à trous") wavelet baseline with a spline through the
/// background anchors.
///
/// The spectrum is smoothed by `level` successive B3 passes with doubling
/// hole spacing. Local minima of every smoothing pass coarser than
/// `levelmin + 1` pick the anchor positions, the endpoints are always
/// anchors, and a natural cubic spline through the measured intensities at
/// those positions is the baseline.
///
/// When `levelmin + 1 >= level` fewer than two scales remain and the
/// baseline is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletSpline {
    pub level: usize,
    pub levelmin: usize,
}

impl Default for WaveletSpline {
    fn default() -> Self {
        Self {
            level: 6,
            levelmin: 2,
        }
    }
}

impl WaveletSpline {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::WaveletSpline.display_name(), params);
        Self {
            level: r.usize_or("level", d.level),
            levelmin: r.usize_or("levelmin", d.levelmin),
        }
    }
}

/// Approximations `c_0 = signal, c_1, …, c_levels` of the à trous transform.
pub fn a_trous(signal: &[f64], levels: usize) -> Vec<Vec<f64>> {
    let n = signal.len();
    let mut approx = Vec::with_capacity(levels + 1);
    approx.push(signal.to_vec());
    for j in 1..=levels {
        let prev = &approx[j - 1];
        // hole spacing saturates once it exceeds the signal
        let step = 1isize << (j - 1).min(30);
        let next: Vec<f64> = (0..n as isize)
            .map(|i| {
                B3_KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, h)| h * prev[reflect_index(i + (k as isize - 2) * step, n)])
                    .sum()
            })
            .collect();
        approx.push(next);
    }
    approx
}

fn interior_minima(c: &[f64]) -> impl Iterator<Item = usize> + '_ {
    (1..c.len().saturating_sub(1)).filter(move |&i| c[i] < c[i - 1] && c[i] <= c[i + 1])
}

impl WaveletSpline {
    fn has_scales(&self) -> bool {
        self.levelmin + 1 < self.level
    }

    /// Sorted anchor indices: both endpoints plus the interior minima of the
    /// approximations `levelmin + 1 ..= level`.
    fn anchors(&self, intensities: &[f64]) -> Vec<usize> {
        let n = intensities.len();
        let approx = a_trous(intensities, self.level);
        let mut anchors = vec![0, n - 1];
        for c in &approx[self.levelmin + 1..=self.level] {
            anchors.extend(interior_minima(c));
        }
        anchors.sort_unstable();
        anchors.dedup();
        anchors
    }
}

impl BaselineEstimator for WaveletSpline {
    fn method(&self) -> Method {
        Method::WaveletSpline
    }

    fn fit(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let n = intensities.len();
        if !self.has_scales() || n == 0 {
            return FitResult::new(vec![0.0; n]);
        }
        let anchors = self.anchors(intensities);
        log::debug!(
            "Wavelet a Trous + Spline: {} anchors from levels {}..={}",
            anchors.len(),
            self.levelmin + 1,
            self.level
        );

        let xp: Vec<f64> = anchors.iter().map(|&i| wavelengths[i]).collect();
        let fp: Vec<f64> = anchors.iter().map(|&i| intensities[i]).collect();
        FitResult::new(CubicSpline::natural(&xp, &fp).evaluate(wavelengths))
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("level_", ParamRange::integer(1.0, 10.0)),
            ("levelmin_", ParamRange::integer(0.0, 9.0)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| 500.0 + 0.5 * i as f64).collect();
        let y = (0..n)
            .map(|i| {
                let v = i as f64;
                200.0 + 0.3 * v + 600.0 * (-((v - 80.0) / 4.0).powi(2)).exp()
                    + 400.0 * (-((v - 170.0) / 6.0).powi(2)).exp()
                    + 5.0 * (v * 0.9).sin()
            })
            .collect();
        (x, y)
    }

    #[test]
    fn smoothing_preserves_constants() {
        let y = vec![3.25; 40];
        for c in a_trous(&y, 5) {
            for v in c {
                assert_abs_diff_eq!(v, 3.25, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn no_usable_scales_gives_zero_baseline() {
        let (x, y) = sample(256);
        for (level, levelmin) in [(6, 5), (3, 3), (2, 7), (1, 0)] {
            let est = WaveletSpline { level, levelmin };
            let base = est.fit(&x, &y).baseline;
            assert_eq!(base, vec![0.0; 256]);
        }
    }

    #[test]
    fn two_scales_are_enough_for_a_baseline() {
        let (x, y) = sample(256);
        let est = WaveletSpline {
            level: 6,
            levelmin: 4,
        };
        let base = est.fit(&x, &y).baseline;
        assert!(base.iter().any(|b| *b != 0.0));
        assert!(base.iter().all(|b| b.is_finite()));
    }

    #[test]
    fn baseline_meets_the_spectrum_at_every_anchor() {
        let (x, y) = sample(256);
        let est = WaveletSpline::default();
        let fit = est.fit(&x, &y);
        let anchors = est.anchors(&y);
        assert_eq!(anchors.first(), Some(&0));
        assert_eq!(anchors.last(), Some(&255));
        assert!(anchors.len() > 2);
        for i in anchors {
            assert_abs_diff_eq!(fit.baseline[i], y[i], epsilon = 1e-9);
            assert_abs_diff_eq!(fit.corrected(&y)[i], 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn peaks_sit_above_the_baseline() {
        let (x, y) = sample(256);
        let fit = WaveletSpline::default().fit(&x, &y);
        assert!(fit.baseline[80] < y[80] - 400.0);
        assert!(fit.baseline[170] < y[170] - 250.0);
        assert!(fit.baseline.iter().all(|b| b.is_finite()));
    }

    #[test]
    fn declared_ranges() {
        let r = WaveletSpline::default().param_ranges();
        assert_eq!(r["level_"].as_tuple(), (1.0, 10.0, crate::ScaleKind::Integer));
        assert_eq!(r["levelmin_"].as_tuple(), (0.0, 9.0, crate::ScaleKind::Integer));
    }
}
