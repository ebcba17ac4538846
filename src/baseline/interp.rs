//! One-dimensional interpolation used to turn anchor points into baselines.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// InterpKind – named interpolation styles
// ---------------------------------------------------------------------------

/// Interpolation style between anchor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpKind {
    Linear,
    Nearest,
    /// Step function holding the value of the anchor on the left.
    Previous,
    /// Step function taking the value of the anchor on the right.
    Next,
    /// Quadratic B-spline with knots midway between the anchors.
    Quadratic,
    /// Not-a-knot cubic spline.
    #[default]
    Cubic,
}

impl FromStr for InterpKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" | "slinear" => Ok(InterpKind::Linear),
            "nearest" => Ok(InterpKind::Nearest),
            "zero" | "previous" => Ok(InterpKind::Previous),
            "next" => Ok(InterpKind::Next),
            "quadratic" => Ok(InterpKind::Quadratic),
            "cubic" => Ok(InterpKind::Cubic),
            other => Err(format!("unknown interpolation kind '{other}'")),
        }
    }
}

impl fmt::Display for InterpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpKind::Linear => "linear",
            InterpKind::Nearest => "nearest",
            InterpKind::Previous => "previous",
            InterpKind::Next => "next",
            InterpKind::Quadratic => "quadratic",
            InterpKind::Cubic => "cubic",
        };
        write!(f, "{name}")
    }
}

/// Evaluate the `kind` interpolant through `(xp, fp)` at every `x`.
///
/// `xp` must be strictly increasing and hold at least one point. Outside
/// `[xp[0], xp[last]]` the end values are held constant.
pub fn interpolate(kind: InterpKind, xp: &[f64], fp: &[f64], x: &[f64]) -> Vec<f64> {
    match kind {
        InterpKind::Linear => linear(xp, fp, x),
        InterpKind::Quadratic => BSpline::interpolating(xp, fp, 2).evaluate(x),
        InterpKind::Cubic => CubicSpline::not_a_knot(xp, fp).evaluate(x),
        InterpKind::Nearest | InterpKind::Previous | InterpKind::Next => x
            .iter()
            .map(|&xi| {
                let (lo, hi) = bracket(xp, xi);
                let pick = match kind {
                    InterpKind::Previous => lo,
                    InterpKind::Next => hi,
                    _ if xi - xp[lo] <= xp[hi] - xi => lo,
                    _ => hi,
                };
                fp[pick]
            })
            .collect(),
    }
}

/// Piecewise-linear interpolation with constant extrapolation.
pub fn linear(xp: &[f64], fp: &[f64], x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&xi| {
            let (lo, hi) = bracket(xp, xi);
            if lo == hi {
                return fp[lo];
            }
            let t = (xi - xp[lo]) / (xp[hi] - xp[lo]);
            fp[lo] + t * (fp[hi] - fp[lo])
        })
        .collect()
}

/// Indices of the knots enclosing `xi`; both equal at or beyond the ends.
fn bracket(xp: &[f64], xi: f64) -> (usize, usize) {
    let last = xp.len() - 1;
    if xi <= xp[0] {
        return (0, 0);
    }
    if xi >= xp[last] {
        return (last, last);
    }
    // first knot strictly greater than xi
    let hi = xp.partition_point(|&k| k <= xi);
    (hi - 1, hi)
}

// ---------------------------------------------------------------------------
// CubicSpline – natural and not-a-knot boundary conditions
// ---------------------------------------------------------------------------

/// Cubic spline `a + b·t + c·t² + d·t³` per interval.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSpline {
    /// Zero curvature at both ends. With fewer than three knots the spline
    /// is the straight line (or constant) through them.
    pub fn natural(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        if n < 3 {
            return Self::from_curvature(x, y, vec![0.0; n]);
        }
        // end rows of the system are c[0] = 0 and c[n-1] = 0
        let (lower, diag, upper, rhs) = interior_rows(x, y);
        let c = solve_tridiagonal(&lower, &diag, &upper, &rhs);
        Self::from_curvature(x, y, c)
    }

    /// Third derivative continuous across the second and second-to-last
    /// knots, so any cubic through four or more knots is reproduced exactly.
    /// Three knots give the parabola through them, two the straight line.
    pub fn not_a_knot(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        match n {
            0..=2 => return Self::from_curvature(x, y, vec![0.0; n]),
            3 => {
                let f01 = (y[1] - y[0]) / (x[1] - x[0]);
                let f12 = (y[2] - y[1]) / (x[2] - x[1]);
                let f012 = (f12 - f01) / (x[2] - x[0]);
                return Self::from_curvature(x, y, vec![f012; 3]);
            }
            _ => {}
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let (mut lower, mut diag, mut upper, mut rhs) = interior_rows(x, y);

        // c[0] and c[n-1] are eliminated with the end conditions
        // d[0] = d[1] and d[n-3] = d[n-2], leaving a system in c[1..n-1].
        let (h0, h1) = (h[0], h[1]);
        diag[1] = h0 + 2.0 * h1;
        upper[1] = h1 - h0;
        rhs[1] *= h1 / (h0 + h1);
        let (p, q) = (h[n - 3], h[n - 2]);
        lower[n - 2] = p - q;
        diag[n - 2] = 2.0 * p + q;
        rhs[n - 2] *= p / (p + q);

        let inner = solve_tridiagonal(
            &lower[1..n - 1],
            &diag[1..n - 1],
            &upper[1..n - 1],
            &rhs[1..n - 1],
        );
        let mut c = vec![0.0; n];
        c[1..n - 1].copy_from_slice(&inner);
        c[0] = ((h0 + h1) * c[1] - h0 * c[2]) / h1;
        c[n - 1] = ((p + q) * c[n - 2] - q * c[n - 3]) / p;
        Self::from_curvature(x, y, c)
    }

    /// Build the per-interval coefficients from the half second derivatives
    /// `c` at the knots.
    fn from_curvature(x: &[f64], y: &[f64], c: Vec<f64>) -> Self {
        let n = x.len();
        let segments = n.saturating_sub(1);
        let mut b = vec![0.0; segments];
        let mut d = vec![0.0; segments];
        for i in 0..segments {
            let h = x[i + 1] - x[i];
            b[i] = (y[i + 1] - y[i]) / h - h * (2.0 * c[i] + c[i + 1]) / 3.0;
            d[i] = (c[i + 1] - c[i]) / (3.0 * h);
        }
        Self {
            x: x.to_vec(),
            a: y.to_vec(),
            b,
            c,
            d,
        }
    }

    /// Evaluate at every point of `x`, holding the end values outside the knots.
    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.evaluate_one(xi)).collect()
    }

    fn evaluate_one(&self, xi: f64) -> f64 {
        let n = self.x.len();
        match n {
            0 => 0.0,
            1 => self.a[0],
            _ => {
                if xi <= self.x[0] {
                    return self.a[0];
                }
                if xi >= self.x[n - 1] {
                    return self.a[n - 1];
                }
                let i = self.x.partition_point(|&k| k <= xi) - 1;
                let t = xi - self.x[i];
                self.a[i] + t * (self.b[i] + t * (self.c[i] + t * self.d[i]))
            }
        }
    }
}

/// Continuity rows `h[i-1]·c[i-1] + 2(h[i-1] + h[i])·c[i] + h[i]·c[i+1] = rhs[i]`
/// for the interior knots; the first and last rows are left empty.
fn interior_rows(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let mut lower = vec![0.0; n];
    let mut diag = vec![1.0; n];
    let mut upper = vec![0.0; n];
    let mut rhs = vec![0.0; n];
    for i in 1..n - 1 {
        lower[i] = h[i - 1];
        diag[i] = 2.0 * (h[i - 1] + h[i]);
        upper[i] = h[i];
        rhs[i] = 3.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
    }
    (lower, diag, upper, rhs)
}

// ---------------------------------------------------------------------------
// BSpline – interpolating B-spline of arbitrary degree
// ---------------------------------------------------------------------------

/// Interpolating B-spline: `degree + 1`-fold end knots, interior knots at
/// the midpoints of the anchor intervals (quadratic) or at the anchors with
/// the second and second-to-last dropped (cubic).
#[derive(Debug, Clone)]
pub struct BSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Fit through `(x, y)`. Fewer than `degree + 1` points fall back to
    /// the piecewise-linear interpolant.
    pub fn interpolating(x: &[f64], y: &[f64], degree: usize) -> Self {
        let n = x.len();
        if degree < 2 || n < degree + 1 {
            return Self::piecewise_linear(x, y);
        }
        let knots = interpolation_knots(x, degree);

        let rows: Vec<(usize, Vec<f64>)> = x
            .iter()
            .map(|&xi| {
                let span = find_span(&knots, degree, n, xi);
                (span - degree, basis_functions(&knots, degree, span, xi))
            })
            .collect();
        let coeffs = solve_banded_collocation(&rows, y, degree);

        Self {
            knots,
            coeffs,
            degree,
        }
    }

    fn piecewise_linear(x: &[f64], y: &[f64]) -> Self {
        match x.len() {
            0 => Self {
                knots: Vec::new(),
                coeffs: Vec::new(),
                degree: 1,
            },
            1 => Self {
                knots: vec![x[0], x[0]],
                coeffs: y.to_vec(),
                degree: 0,
            },
            n => {
                let mut knots = Vec::with_capacity(n + 2);
                knots.push(x[0]);
                knots.extend_from_slice(x);
                knots.push(x[n - 1]);
                Self {
                    knots,
                    coeffs: y.to_vec(),
                    degree: 1,
                }
            }
        }
    }

    /// Evaluate at every point of `x`, holding the end values outside the knots.
    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.evaluate_one(xi)).collect()
    }

    fn evaluate_one(&self, xi: f64) -> f64 {
        let n = self.coeffs.len();
        match n {
            0 => 0.0,
            1 => self.coeffs[0],
            _ => {
                let k = self.degree;
                let lo = self.knots[k];
                let hi = self.knots[n];
                let xi = xi.clamp(lo, hi);
                let span = find_span(&self.knots, k, n, xi);
                basis_functions(&self.knots, k, span, xi)
                    .iter()
                    .enumerate()
                    .map(|(r, b)| b * self.coeffs[span - k + r])
                    .sum()
            }
        }
    }
}

fn interpolation_knots(x: &[f64], degree: usize) -> Vec<f64> {
    let n = x.len();
    let last = x[n - 1];
    let mut knots = vec![x[0]; degree + 1];
    if degree % 2 == 0 {
        // midpoints of the intervals, skipping the first and last
        knots.extend(x.windows(2).skip(1).take(n - 3).map(|w| 0.5 * (w[0] + w[1])));
    } else {
        let m = (degree - 1) / 2;
        knots.extend_from_slice(&x[m + 1..n - m - 1]);
    }
    knots.extend(std::iter::repeat(last).take(degree + 1));
    knots
}

/// Knot interval `t[span] <= xi < t[span + 1]`, clamped to `degree..=n_basis - 1`.
fn find_span(knots: &[f64], degree: usize, n_basis: usize, xi: f64) -> usize {
    let idx = knots.partition_point(|&t| t <= xi).saturating_sub(1);
    idx.clamp(degree, n_basis - 1)
}

/// The `degree + 1` non-zero basis functions `N[span-degree..=span]` at `xi`
/// (Cox–de Boor recurrence).
fn basis_functions(knots: &[f64], degree: usize, span: usize, xi: f64) -> Vec<f64> {
    let mut out = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    out[0] = 1.0;
    for j in 1..=degree {
        left[j] = xi - knots[span + 1 - j];
        right[j] = knots[span + j] - xi;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = out[r] / (right[r + 1] + left[j - r]);
            out[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        out[j] = saved;
    }
    out
}

/// Solve the square collocation system whose row `i` holds `values` from
/// column `start`. B-spline collocation matrices are totally positive, so
/// elimination runs without pivoting inside the band.
fn solve_banded_collocation(rows: &[(usize, Vec<f64>)], rhs: &[f64], degree: usize) -> Vec<f64> {
    let n = rows.len();
    let below = rows.iter().enumerate().map(|(i, (s, _))| i.saturating_sub(*s)).max().unwrap_or(0);
    let above = rows
        .iter()
        .enumerate()
        .map(|(i, (s, _))| (s + degree).saturating_sub(i))
        .max()
        .unwrap_or(0);
    let width = below + above + 1;

    // band[i][j + below - i] holds A[i][j]
    let mut band = vec![vec![0.0; width]; n];
    for (i, (start, values)) in rows.iter().enumerate() {
        for (r, v) in values.iter().enumerate() {
            let j = start + r;
            if j < n {
                band[i][j + below - i] = *v;
            }
        }
    }
    let mut b = rhs.to_vec();

    for col in 0..n {
        let pivot = band[col][below];
        for row in col + 1..=(col + below).min(n - 1) {
            let factor = band[row][col + below - row] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..=(col + above).min(n - 1) {
                band[row][j + below - row] -= factor * band[col][j + below - col];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut out = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = (i + 1..=(i + above).min(n - 1))
            .map(|j| band[i][j + below - i] * out[j])
            .sum();
        out[i] = (b[i] - tail) / band[i][below];
    }
    out
}

/// Thomas algorithm; `lower[0]` and `upper[n-1]` are ignored.
fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    c_prime[0] = upper[0] / diag[0];
    d_prime[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - lower[i] * c_prime[i - 1];
        c_prime[i] = if i < n - 1 { upper[i] / denom } else { 0.0 };
        d_prime[i] = (rhs[i] - lower[i] * d_prime[i - 1]) / denom;
    }

    let mut out = vec![0.0; n];
    out[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d_prime[i] - c_prime[i] * out[i + 1];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_holds_end_values_outside_the_knots() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [0.0, 2.0, 6.0];
        let got = linear(&xp, &fp, &[-1.0, 0.5, 2.0, 3.0, 4.0]);
        assert_eq!(got, vec![0.0, 1.0, 4.0, 6.0, 6.0]);
    }

    #[test]
    fn spline_passes_through_knots_and_reproduces_lines() {
        let xp = [0.0, 1.0, 2.5, 4.0, 5.0];
        let fp: Vec<f64> = xp.iter().map(|x| 3.0 - 0.5 * x).collect();
        let spline = CubicSpline::natural(&xp, &fp);

        for (x, y) in xp.iter().zip(&fp) {
            assert_abs_diff_eq!(spline.evaluate_one(*x), *y, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(spline.evaluate_one(3.3), 3.0 - 0.5 * 3.3, epsilon = 1e-12);
    }

    #[test]
    fn two_knot_spline_is_a_line() {
        let got = CubicSpline::natural(&[0.0, 2.0], &[1.0, 5.0]).evaluate(&[1.0]);
        assert_abs_diff_eq!(got[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn step_kinds_pick_the_expected_side() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [10.0, 20.0, 30.0];
        let x = [0.2, 0.8];
        assert_eq!(interpolate(InterpKind::Previous, &xp, &fp, &x), vec![10.0, 10.0]);
        assert_eq!(interpolate(InterpKind::Next, &xp, &fp, &x), vec![20.0, 20.0]);
        assert_eq!(interpolate(InterpKind::Nearest, &xp, &fp, &x), vec![10.0, 20.0]);
    }

    #[test]
    fn kind_names_parse() {
        assert_eq!("slinear".parse::<InterpKind>(), Ok(InterpKind::Linear));
        assert_eq!("zero".parse::<InterpKind>(), Ok(InterpKind::Previous));
        assert_eq!("quadratic".parse::<InterpKind>(), Ok(InterpKind::Quadratic));
        assert!("quintic".parse::<InterpKind>().is_err());
    }

    #[test]
    fn cubic_kind_reproduces_a_cubic() {
        let xp = [0.0, 1.0, 2.0, 3.0, 4.0];
        let fp: Vec<f64> = xp.iter().map(|x: &f64| x.powi(3)).collect();
        let got = interpolate(InterpKind::Cubic, &xp, &fp, &[0.5, 3.5]);
        assert_abs_diff_eq!(got[0], 0.125, epsilon = 1e-10);
        assert_abs_diff_eq!(got[1], 42.875, epsilon = 1e-10);
    }

    #[test]
    fn not_a_knot_is_exact_on_uneven_knots() {
        let cubic = |x: f64| 2.0 - x + 0.5 * x * x - 0.25 * x.powi(3);
        for xp in [vec![0.0, 0.7, 2.0, 2.5], vec![-1.0, 0.2, 0.9, 2.4, 3.0, 4.6, 5.0]] {
            let fp: Vec<f64> = xp.iter().map(|&x| cubic(x)).collect();
            let spline = CubicSpline::not_a_knot(&xp, &fp);
            for x in [0.1, 0.35, 1.3, 2.2] {
                assert_abs_diff_eq!(spline.evaluate_one(x), cubic(x), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn three_knot_not_a_knot_is_the_parabola() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [1.0, 2.0, 10.0];
        let got = CubicSpline::not_a_knot(&xp, &fp).evaluate(&[2.0]);
        // 1 + 0·x + x²
        assert_abs_diff_eq!(got[0], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn quadratic_kind_reproduces_a_parabola() {
        let parabola = |x: f64| 3.0 - 2.0 * x + 0.75 * x * x;
        let xp = [0.0, 0.5, 1.7, 2.0, 3.1, 4.0];
        let fp: Vec<f64> = xp.iter().map(|&x| parabola(x)).collect();
        let x = [0.25, 1.0, 1.9, 2.6, 3.9, 4.0];
        let got = interpolate(InterpKind::Quadratic, &xp, &fp, &x);
        for (g, xi) in got.iter().zip(x) {
            assert_abs_diff_eq!(*g, parabola(xi), epsilon = 1e-9);
        }
    }

    #[test]
    fn quadratic_spline_passes_through_its_anchors() {
        let xp = [0.0, 1.0, 1.5, 4.0, 4.2, 7.0, 9.0];
        let fp = [5.0, 1.0, 4.0, 0.5, 2.0, 8.0, 3.0];
        let got = BSpline::interpolating(&xp, &fp, 2).evaluate(&xp);
        for (g, f) in got.iter().zip(&fp) {
            assert_abs_diff_eq!(*g, *f, epsilon = 1e-9);
        }
    }

    #[test]
    fn short_quadratic_input_is_linear() {
        let got = interpolate(InterpKind::Quadratic, &[0.0, 2.0], &[1.0, 5.0], &[-1.0, 0.5, 3.0]);
        assert_abs_diff_eq!(got[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(got[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(got[2], 5.0, epsilon = 1e-12);
    }
}
