use std::ops::Range;

use ndarray::{s, ArrayView2};

/// Largest step between consecutive wavelengths that still counts as
/// contiguous, in wavelength units.
pub const DEFAULT_GAP_THRESHOLD: f64 = 1.0;

// ---------------------------------------------------------------------------
// Segment – one gap-free run of the wavelength axis
// ---------------------------------------------------------------------------

/// A maximal run of the wavelength axis with no internal gap above the
/// threshold, together with the matching columns of the intensity grid.
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    /// Column indices `start..end` of the run in the full axis.
    pub range: Range<usize>,
    pub wavelengths: &'a [f64],
    pub spectra: ArrayView2<'a, f64>,
}

// ---------------------------------------------------------------------------
// Segments – lazy iterator over the runs
// ---------------------------------------------------------------------------

/// Lazy iterator over the [`Segment`]s of a wavelength axis.
///
/// Clone it before consuming to walk the runs twice; [`segments`] only
/// borrows its inputs, so calling it again also starts over.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    wavelengths: &'a [f64],
    spectra: ArrayView2<'a, f64>,
    gap_threshold: f64,
    next_start: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.wavelengths.len();
        let start = self.next_start;
        if start >= n {
            return None;
        }
        let mut end = start + 1;
        while end < n && self.wavelengths[end] - self.wavelengths[end - 1] <= self.gap_threshold {
            end += 1;
        }
        self.next_start = end;

        Some(Segment {
            range: start..end,
            wavelengths: &self.wavelengths[start..end],
            spectra: self.spectra.slice_move(s![.., start..end]),
        })
    }
}

/// Split `wavelengths` (and the columns of `spectra`) at every step larger
/// than [`DEFAULT_GAP_THRESHOLD`].
pub fn segments<'a>(wavelengths: &'a [f64], spectra: ArrayView2<'a, f64>) -> Segments<'a> {
    segments_with_threshold(wavelengths, spectra, DEFAULT_GAP_THRESHOLD)
}

/// Split `wavelengths` (and the columns of `spectra`) at every step larger
/// than `gap_threshold`.
///
/// `spectra` must have one column per wavelength.
pub fn segments_with_threshold<'a>(
    wavelengths: &'a [f64],
    spectra: ArrayView2<'a, f64>,
    gap_threshold: f64,
) -> Segments<'a> {
    Segments {
        wavelengths,
        spectra,
        gap_threshold,
        next_start: 0,
    }
}
