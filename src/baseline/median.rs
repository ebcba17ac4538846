use super::common::reflect_index;
use super::params::{ParamRange, ParamRanges, ParamReader, Params};
use super::{BaselineEstimator, FitResult, Method};

/// Sliding-window median filter as a baseline.
///
/// The window holds `window_size / 2` samples before the centre and the rest
/// after it; samples beyond the ends are mirrored. For even windows the
/// upper of the two middle values is taken.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianFilter {
    pub window_size: usize,
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self { window_size: 501 }
    }
}

impl MedianFilter {
    pub fn from_params(params: Option<&Params>) -> Self {
        let r = ParamReader::new(Method::Median.display_name(), params);
        Self {
            window_size: r.usize_or("window_size", Self::default().window_size),
        }
    }
}

/// Rank filter selecting element `size / 2` of each sorted window.
pub fn median_filter(signal: &[f64], size: usize) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let size = size.max(1);
    let before = (size / 2) as isize;
    let mut window = Vec::with_capacity(size);

    (0..n as isize)
        .map(|i| {
            window.clear();
            window.extend((0..size as isize).map(|k| signal[reflect_index(i - before + k, n)]));
            let (_, median, _) = window.select_nth_unstable_by(size / 2, f64::total_cmp);
            *median
        })
        .collect()
}

impl BaselineEstimator for MedianFilter {
    fn method(&self) -> Method {
        Method::Median
    }

    fn fit(&self, _wavelengths: &[f64], intensities: &[f64]) -> FitResult {
        FitResult::new(median_filter(intensities, self.window_size))
    }

    fn param_ranges(&self) -> ParamRanges {
        ParamRanges::from([("window_", ParamRange::integer(201.0, 901.0))])
    }
}
