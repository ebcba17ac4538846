use std::collections::BTreeSet;
use std::ops::Range;

use super::common::lower_hull;
use super::interp::linear;
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Rubberband (lower convex envelope) baseline.
///
/// The spectrum is cut into `num_ranges` contiguous ranges and the minimum
/// of each range, together with both endpoints, seeds the anchor set. The
/// baseline is the lower convex hull of the anchors, linearly interpolated.
///
/// Each of the `num_iters` refinement passes looks, in every range, for the
/// sample lying furthest below the current envelope and adds it to the
/// anchors. A larger anchor set can only lower the hull, so refinement
/// never raises the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Rubberband {
    pub num_iters: usize,
    pub num_ranges: usize,
}

impl Default for Rubberband {
    fn default() -> Self {
        Self {
            num_iters: 8,
            num_ranges: 64,
        }
    }
}

impl Rubberband {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::Rubberband.display_name(), params);
        Self {
            num_iters: r.usize_or("num_iters", d.num_iters),
            num_ranges: r.usize_or("num_ranges", d.num_ranges),
        }
    }
}

/// Split `0..n` into `parts` contiguous ranges whose lengths differ by at
/// most one, longer ranges first.
fn split_ranges(n: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, n.max(1));
    let base = n / parts;
    let extra = n % parts;
    let mut start = 0;
    (0..parts)
        .map(|k| {
            let len = base + usize::from(k < extra);
            let r = start..start + len;
            start += len;
            r
        })
        .filter(|r| !r.is_empty())
        .collect()
}

fn argmin_by_key(range: Range<usize>, key: impl Fn(usize) -> f64) -> Option<usize> {
    range.min_by(|&a, &b| key(a).total_cmp(&key(b)))
}

fn envelope(x: &[f64], y: &[f64], anchors: &BTreeSet<usize>) -> Vec<f64> {
    let candidates: Vec<usize> = anchors.iter().copied().collect();
    let hull = lower_hull(x, y, &candidates);
    let xp: Vec<f64> = hull.iter().map(|&i| x[i]).collect();
    let fp: Vec<f64> = hull.iter().map(|&i| y[i]).collect();
    linear(&xp, &fp, x)
}

impl BaselineEstimator for Rubberband {
    fn method(&self) -> Method {
        Method::Rubberband
    }

    fn fit(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let n = intensities.len();
        if n == 0 {
            return FitResult::new(Vec::new());
        }
        let ranges = split_ranges(n, self.num_ranges);

        let mut anchors: BTreeSet<usize> = BTreeSet::from([0, n - 1]);
        anchors.extend(
            ranges
                .iter()
                .filter_map(|r| argmin_by_key(r.clone(), |i| intensities[i])),
        );
        let mut baseline = envelope(wavelengths, intensities, &anchors);

        for pass in 0..self.num_iters {
            let below: Vec<usize> = ranges
                .iter()
                .filter_map(|r| argmin_by_key(r.clone(), |i| intensities[i] - baseline[i]))
                .filter(|&i| intensities[i] < baseline[i] && !anchors.contains(&i))
                .collect();
            if below.is_empty() {
                log::debug!("Rubberband: envelope settled after {pass} refinement passes");
                break;
            }
            anchors.extend(below);
            let refined = envelope(wavelengths, intensities, &anchors);
            for (b, r) in baseline.iter_mut().zip(refined) {
                *b = b.min(r);
            }
        }

        FitResult::new(baseline)
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([
            ("num_ranges_", ParamRange::integer(1.0, 100.0)),
            ("num_iters_", ParamRange::integer(0.0, 36.0)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curved(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y = x
            .iter()
            .map(|v| {
                let t = v / n as f64;
                1000.0 - 300.0 * t + 400.0 * (t - 0.5).powi(2) * 4.0
                    + 250.0 * (-((v - 0.3 * n as f64) / 5.0).powi(2)).exp()
                    + 15.0 * (v * 1.7).sin()
            })
            .collect();
        (x, y)
    }

    #[test]
    fn ranges_cover_the_axis_without_overlap() {
        let r = split_ranges(10, 4);
        assert_eq!(r, vec![0..3, 3..6, 6..8, 8..10]);
        assert_eq!(split_ranges(3, 10).len(), 3);
        assert_eq!(split_ranges(5, 0), vec![0..5]);
    }

    #[test]
    fn single_pass_is_the_hull_of_range_minima() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 2.0, 8.0, 9.0, 3.0, 10.0];
        let fit = Rubberband {
            num_iters: 0,
            num_ranges: 2,
        }
        .fit(&x, &y);
        assert_eq!(fit.baseline[1], 2.0);
        assert_eq!(fit.baseline[4], 3.0);
        assert!((fit.baseline[2] - (2.0 + 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn refinement_never_raises_the_envelope() {
        let (x, y) = curved(300);
        let single = Rubberband {
            num_iters: 0,
            num_ranges: 4,
        }
        .fit(&x, &y)
        .baseline;
        for iters in [1, 2, 8, 36] {
            let refined = Rubberband {
                num_iters: iters,
                num_ranges: 4,
            }
            .fit(&x, &y)
            .baseline;
            for (r, s) in refined.iter().zip(&single) {
                assert!(r <= s, "{iters} passes raised the envelope: {r} > {s}");
            }
        }
    }

    #[test]
    fn endpoints_are_always_anchors() {
        let (x, y) = curved(200);
        let fit = Rubberband::default().fit(&x, &y);
        assert_eq!(fit.baseline[0], y[0]);
        assert_eq!(fit.baseline[199], y[199]);
    }

    #[test]
    fn declared_ranges() {
        let r = Rubberband::default().param_ranges();
        assert_eq!(r["num_ranges_"].as_tuple(), (1.0, 100.0, crate::ScaleKind::Integer));
        assert_eq!(r["num_iters_"].as_tuple(), (0.0, 36.0, crate::ScaleKind::Integer));
        assert_eq!(r.len(), 2);
    }
}
