use super::interp::{interpolate, InterpKind};
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Baseline through local minima.
///
/// An interior sample is an anchor when it is the minimum of the
/// `±window` samples around it (clipped at the ends). The first and last
/// samples are always anchors, and the anchors are joined with `kind`
/// interpolation over the wavelength axis.
///
/// With `window` at least as long as the spectrum, or no interior anchor,
/// there is nothing to interpolate and the baseline is all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimumInterp {
    pub window: usize,
    pub kind: InterpKind,
}

impl Default for MinimumInterp {
    fn default() -> Self {
        Self {
            window: 100,
            kind: InterpKind::Cubic,
        }
    }
}

impl MinimumInterp {
    pub fn from_params(params: Option<&Params>) -> Self {
        let d = Self::default();
        let r = ParamReader::new(Method::MinInterp.display_name(), params);
        let kind_name = r.str_or("kind", &d.kind.to_string());
        let kind = kind_name.parse().unwrap_or_else(|e| {
            log::warn!("Min + Interpolate: {e}, using {}", d.kind);
            d.kind
        });
        Self {
            window: r.usize_or("window", d.window),
            kind,
        }
    }
}

/// Interior indices that are the first minimum of their `±window` neighbourhood.
fn local_minima(y: &[f64], window: usize) -> Vec<usize> {
    let n = y.len();
    (1..n.saturating_sub(1))
        .filter(|&i| {
            let lo = i.saturating_sub(window);
            let hi = (i + window).min(n - 1);
            y[lo..i].iter().all(|&v| y[i] < v) && y[i + 1..=hi].iter().all(|&v| y[i] <= v)
        })
        .collect()
}

impl BaselineEstimator for MinimumInterp {
    fn method(&self) -> Method {
        Method::MinInterp
    }

    fn fit(&self, wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        let n = intensities.len();
        if self.window >= n {
            return FitResult::new(vec![0.0; n]);
        }
        let minima = local_minima(intensities, self.window.max(1));
        if minima.is_empty() {
            log::debug!("Min + Interpolate: no interior minima for window {}", self.window);
            return FitResult::new(vec![0.0; n]);
        }

        let mut anchors = Vec::with_capacity(minima.len() + 2);
        anchors.push(0);
        anchors.extend(minima);
        anchors.push(n - 1);

        let xp: Vec<f64> = anchors.iter().map(|&i| wavelengths[i]).collect();
        let fp: Vec<f64> = anchors.iter().map(|&i| intensities[i]).collect();
        FitResult::new(interpolate(self.kind, &xp, &fp, wavelengths))
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([("window_", ParamRange::integer(1.0, 500.0))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::params::{params, ParamValue};

    fn bumpy(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| 300.0 + i as f64).collect();
        let y = (0..n)
            .map(|i| 50.0 + 20.0 * (i as f64 * 0.3).sin().abs() + 0.05 * i as f64)
            .collect();
        (x, y)
    }

    #[test]
    fn oversized_window_gives_zero_baseline() {
        let (x, y) = bumpy(40);
        let est = MinimumInterp {
            window: 1000,
            kind: InterpKind::Cubic,
        };
        let fit = est.fit(&x, &y);
        assert!(fit.baseline.iter().all(|b| *b == 0.0));
        assert_eq!(fit.corrected(&y), y);
    }

    #[test]
    fn baseline_passes_through_anchors() {
        let (x, y) = bumpy(120);
        let est = MinimumInterp {
            window: 5,
            kind: InterpKind::Linear,
        };
        let fit = est.fit(&x, &y);
        assert_eq!(fit.baseline[0], y[0]);
        assert_eq!(fit.baseline[119], y[119]);
        for i in local_minima(&y, 5) {
            assert_eq!(fit.baseline[i], y[i]);
        }
    }

    #[test]
    fn plateau_yields_a_single_anchor() {
        let y = [5.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        assert_eq!(local_minima(&y, 2), vec![1]);
    }

    #[test]
    fn unknown_kind_falls_back_to_cubic() {
        let p = params([("kind", ParamValue::from("quintic")), ("window", 7usize.into())]);
        let est = MinimumInterp::from_params(Some(&p));
        assert_eq!(est.kind, InterpKind::Cubic);
        assert_eq!(est.window, 7);
    }

    #[test]
    fn quadratic_kind_is_kept() {
        let p = params([("kind", ParamValue::from("quadratic"))]);
        let est = MinimumInterp::from_params(Some(&p));
        assert_eq!(est.kind, InterpKind::Quadratic);

        let (x, y) = bumpy(120);
        let fit = MinimumInterp { window: 5, ..est }.fit(&x, &y);
        for i in local_minima(&y, 5) {
            approx::assert_abs_diff_eq!(fit.baseline[i], y[i], epsilon = 1e-9);
        }
    }
}
