//! Least-squares polynomial fitting.
//!
//! Builds the Vandermonde system, normalizes its columns and solves it with an
//! SVD pseudo-inverse. Rank-deficient systems (fewer distinct samples than
//! coefficients) get the minimum-norm solution instead of failing.

use nalgebra::{DMatrix, DVector};

/// Iteration cap for the SVD; a system that needs more is reported as no fit.
const SVD_MAX_ITERATIONS: usize = 1000;

/// Polynomial with coefficients stored highest power first:
/// `c[0] * x^n + c[1] * x^(n-1) + ... + c[n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        assert!(!coefficients.is_empty(), "polynomial needs a coefficient");
        Self { coefficients }
    }

    /// Least-squares fit of `ys ≈ p(xs)` with `p` of the given degree.
    ///
    /// Returns `None` for empty, mismatched or non-finite input, when a power
    /// of `x` overflows, when the SVD does not converge, or when the solution
    /// is not finite.
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        if !xs.iter().chain(ys).all(|v| v.is_finite()) {
            return None;
        }

        let rows = xs.len();
        let cols = degree + 1;
        let power = |c: usize| (degree - c) as i32;

        // Column scaling keeps x^2 and x^0 columns comparable for pixel-sized x.
        let scales: Vec<f64> = (0..cols)
            .map(|c| {
                let norm = xs.iter().map(|x| x.powi(power(c)).powi(2)).sum::<f64>().sqrt();
                if norm > 0.0 {
                    norm
                } else {
                    1.0
                }
            })
            .collect();
        if !scales.iter().all(|s| s.is_finite()) {
            return None;
        }

        let lhs = DMatrix::from_fn(rows, cols, |r, c| xs[r].powi(power(c)) / scales[c]);
        let rhs = DVector::from_column_slice(ys);

        let svd = lhs.try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)?;
        let max_singular = svd
            .singular_values
            .iter()
            .copied()
            .fold(0.0f64, f64::max);
        let rcond = rows.max(cols) as f64 * f64::EPSILON;
        let solution = svd.solve(&rhs, max_singular * rcond).ok()?;

        let coefficients: Vec<f64> = solution
            .iter()
            .zip(&scales)
            .map(|(c, s)| c / s)
            .collect();

        coefficients
            .iter()
            .all(|c| c.is_finite())
            .then(|| Self::new(coefficients))
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Horner evaluation.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    pub fn derivative(&self) -> Self {
        let n = self.degree();
        if n == 0 {
            return Self::new(vec![0.0]);
        }
        let coefficients = self.coefficients[..n]
            .iter()
            .enumerate()
            .map(|(i, &c)| c * (n - i) as f64)
            .collect();
        Self::new(coefficients)
    }

    /// First derivative at `x`.
    pub fn slope_at(&self, x: f64) -> f64 {
        self.derivative().evaluate(x)
    }
}
