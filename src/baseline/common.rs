//! Small numeric helpers shared by several estimators.

/// Map any (possibly out-of-range) index onto `0..n` by mirror reflection
/// about the array edges, repeating the edge sample (`d c b a | a b c d | d c b a`).
pub fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m >= n as isize {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Mark the "quiet" samples of a non-negative signal.
///
/// Starting from all samples, repeatedly recompute the mean and standard
/// deviation of the currently marked samples and keep only those at most
/// `num_stds` deviations above the mean, until the mask stops changing.
pub fn iterative_threshold(signal: &[f64], num_stds: f64) -> Vec<bool> {
    let mut mask = vec![true; signal.len()];
    // each pass either changes the mask or stops; cap guards against cycling
    for _ in 0..=signal.len() {
        let kept: Vec<f64> = signal
            .iter()
            .zip(&mask)
            .filter_map(|(v, keep)| keep.then_some(*v))
            .collect();
        if kept.is_empty() {
            break;
        }
        let cutoff = mean(&kept) + num_stds * std_dev(&kept);
        let next: Vec<bool> = signal.iter().map(|&v| v <= cutoff).collect();
        if next == mask {
            break;
        }
        mask = next;
    }
    mask
}

/// Minimum that lets NaN win, so ill-defined inputs stay visible downstream.
pub fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Maximum that lets NaN win.
pub fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Indices (ascending) of the lower convex hull of the points
/// `(x[i], y[i])` for `i` in `candidates`, which must be sorted ascending.
pub fn lower_hull(x: &[f64], y: &[f64], candidates: &[usize]) -> Vec<usize> {
    let mut hull: Vec<usize> = Vec::with_capacity(candidates.len());
    for &p in candidates {
        while hull.len() >= 2 {
            let o = hull[hull.len() - 2];
            let a = hull[hull.len() - 1];
            let cross = (x[a] - x[o]) * (y[p] - y[o]) - (y[a] - y[o]) * (x[p] - x[o]);
            if cross <= 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(p);
    }
    hull
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reflect_repeats_edge_samples() {
        let mapped: Vec<usize> = (-3..8).map(|i| reflect_index(i, 5)).collect();
        assert_eq!(mapped, vec![2, 1, 0, 0, 1, 2, 3, 4, 4, 3, 2]);
    }

    #[test]
    fn reflect_handles_windows_wider_than_the_signal() {
        assert_eq!(reflect_index(-7, 3), 0);
        assert_eq!(reflect_index(9, 3), 2);
    }

    #[test]
    fn threshold_drops_outliers() {
        let mut signal = vec![1.0; 40];
        signal[7] = 100.0;
        signal[30] = 80.0;
        let mask = iterative_threshold(&signal, 3.0);
        assert!(!mask[7]);
        assert!(!mask[30]);
        assert_eq!(mask.iter().filter(|m| **m).count(), 38);
    }

    #[test]
    fn constant_signal_is_all_quiet() {
        assert!(iterative_threshold(&[2.0; 10], 3.0).iter().all(|m| *m));
    }

    #[test]
    fn hull_skips_points_above_the_chord() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 5.0, 1.0, 5.0, 0.0];
        assert_eq!(lower_hull(&x, &y, &[0, 1, 2, 3, 4]), vec![0, 4]);

        let y = [4.0, 1.0, 0.5, 1.0, 4.0];
        assert_eq!(lower_hull(&x, &y, &[0, 1, 2, 3, 4]), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn nan_aware_extrema() {
        assert!(nan_min(f64::NAN, 1.0).is_nan());
        assert!(nan_max(1.0, f64::NAN).is_nan());
        assert_abs_diff_eq!(nan_min(2.0, 1.0), 1.0);
        assert_abs_diff_eq!(std_dev(&[1.0, 3.0]), 1.0);
    }
}
