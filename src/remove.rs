//! Baseline removal over a whole dataset.

use crate::baseline::{Method, Params};
use crate::data::model::SpectralDataset;

/// Value a [`Removal::NotRecognized`] compares equal to.
pub const NOT_RECOGNIZED: i32 = 0;

/// Outcome of [`remove_baseline`].
///
/// An unknown method name is not an error: it yields `NotRecognized`, which
/// compares equal to `0` so callers can test `result == 0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    Removed {
        /// `spectra - baseline`, in the input's shape.
        corrected: SpectralDataset,
        baseline: SpectralDataset,
    },
    NotRecognized,
}

impl Removal {
    pub fn is_removed(&self) -> bool {
        matches!(self, Removal::Removed { .. })
    }

    /// `(corrected, baseline)`, or `None` if the method was not recognized.
    pub fn into_pair(self) -> Option<(SpectralDataset, SpectralDataset)> {
        match self {
            Removal::Removed {
                corrected,
                baseline,
            } => Some((corrected, baseline)),
            Removal::NotRecognized => None,
        }
    }
}

impl PartialEq<i32> for Removal {
    fn eq(&self, other: &i32) -> bool {
        matches!(self, Removal::NotRecognized) && *other == NOT_RECOGNIZED
    }
}

/// Estimate and subtract the baseline of every spectrum in `dataset`.
///
/// `method` must be one of the display names of [`Method`], matched
/// exactly. `params` overrides the method's defaults; unknown keys are
/// ignored. Metadata columns are copied unchanged into both outputs.
pub fn remove_baseline(dataset: &SpectralDataset, method: &str, params: Option<&Params>) -> Removal {
    remove_with(dataset, method, params, false)
}

/// Like [`remove_baseline`], but each gap-free run of the wavelength axis
/// is fitted separately.
pub fn remove_baseline_segmented(
    dataset: &SpectralDataset,
    method: &str,
    params: Option<&Params>,
) -> Removal {
    remove_with(dataset, method, params, true)
}

fn remove_with(
    dataset: &SpectralDataset,
    method: &str,
    params: Option<&Params>,
    segmented: bool,
) -> Removal {
    let Some(resolved) = Method::from_name(method) else {
        log::warn!("Baseline method '{method}' not recognized, no baseline removed");
        return Removal::NotRecognized;
    };
    log::debug!(
        "Removing baseline with {resolved} from {} spectra{}",
        dataset.len(),
        if segmented { " (segmented)" } else { "" }
    );

    let estimator = resolved.build(params);
    let spectra = dataset.spectra.view();
    let baseline = if segmented {
        estimator.fit_transform_segmented(&dataset.wavelengths, spectra)
    } else {
        estimator.fit_transform(&dataset.wavelengths, spectra)
    };
    let corrected = &dataset.spectra - &baseline;

    Removal::Removed {
        corrected: dataset.with_spectra(corrected),
        baseline: dataset.with_spectra(baseline),
    }
}
