//! Name → estimator registry.

use std::fmt;

use super::airpls::AirPls;
use super::als::Als;
use super::dietrich::Dietrich;
use super::fabc::Fabc;
use super::kajfosz_kwiatek::KajfoszKwiatek;
use super::median::MedianFilter;
use super::mininterp::MinimumInterp;
use super::params::Params;
use super::polyfit::PolyFit;
use super::rubberband::Rubberband;
use super::wavelet::WaveletSpline;
use super::BaselineEstimator;

/// One of the supported baseline algorithms.
///
/// Methods are looked up by their display name, which is matched exactly
/// (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    MinInterp,
    WaveletSpline,
    Rubberband,
    Median,
    Kk,
    Fabc,
    Polyfit,
    Dietrich,
    AirPls,
    Als,
}

impl Method {
    /// Every method, in menu order.
    pub const ALL: [Method; 10] = [
        Method::MinInterp,
        Method::WaveletSpline,
        Method::Rubberband,
        Method::Median,
        Method::Kk,
        Method::Fabc,
        Method::Polyfit,
        Method::Dietrich,
        Method::AirPls,
        Method::Als,
    ];

    pub const fn display_name(&self) -> &'static str {
        match self {
            Method::MinInterp => "Min + Interpolate",
            Method::WaveletSpline => "Wavelet a Trous + Spline",
            Method::Rubberband => "Rubberband",
            Method::Median => "Median",
            Method::Kk => "KK",
            Method::Fabc => "FABC",
            Method::Polyfit => "Polyfit",
            Method::Dietrich => "Dietrich",
            Method::AirPls => "AirPLS",
            Method::Als => "ALS",
        }
    }

    /// Resolve a display name; `None` if it names no method.
    pub fn from_name(name: &str) -> Option<Method> {
        Self::ALL.into_iter().find(|m| m.display_name() == name)
    }

    /// Construct the estimator, taking parameters from `params` and falling
    /// back to the method's defaults for anything missing.
    pub fn build(&self, params: Option<&Params>) -> Box<dyn BaselineEstimator> {
        match self {
            Method::MinInterp => Box::new(MinimumInterp::from_params(params)),
            Method::WaveletSpline => Box::new(WaveletSpline::from_params(params)),
            Method::Rubberband => Box::new(Rubberband::from_params(params)),
            Method::Median => Box::new(MedianFilter::from_params(params)),
            Method::Kk => Box::new(KajfoszKwiatek::from_params(params)),
            Method::Fabc => Box::new(Fabc::from_params(params)),
            Method::Polyfit => Box::new(PolyFit::from_params(params)),
            Method::Dietrich => Box::new(Dietrich::from_params(params)),
            Method::AirPls => Box::new(AirPls::from_params(params)),
            Method::Als => Box::new(Als::from_params(params)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::params::{params, ParamValue};

    #[test]
    fn names_round_trip() {
        for m in Method::ALL {
            assert_eq!(Method::from_name(m.display_name()), Some(m));
            assert_eq!(m.to_string(), m.display_name());
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(Method::from_name("KK"), Some(Method::Kk));
        assert_eq!(Method::from_name("kk"), None);
        assert_eq!(Method::from_name("ALS "), None);
        assert_eq!(Method::from_name("Min+Interpolate"), None);
        assert_eq!(Method::from_name("foo"), None);
    }

    #[test]
    fn built_estimators_report_their_method() {
        for m in Method::ALL {
            assert_eq!(m.build(None).method(), m);
        }
    }

    #[test]
    fn build_forwards_params() {
        let p = params([("window_size", ParamValue::from(1usize))]);
        let est = Method::Median.build(Some(&p));
        let y = [4.0, 9.0, 1.0, 7.0];
        assert_eq!(est.fit(&y, &y).baseline, y.to_vec());
    }
}
