//! Linear model implementations

use super::models::{check_fit_input, check_predict_width, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Relative jitter added to the Gram diagonal of unpenalized least squares.
/// One-hot blocks make the centered design rank deficient.
const OLS_JITTER: f64 = 1e-10;

/// Cholesky factor of a symmetric matrix, stored in the lower triangle.
/// `None` when the matrix is not numerically positive definite.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let head = l.row(j).slice(ndarray::s![..j]).to_owned();
        let d = a[[j, j]] - head.dot(&head);
        if !(d > 0.0) || !d.is_finite() {
            return None;
        }
        let d = d.sqrt();
        l[[j, j]] = d;
        for i in (j + 1)..n {
            let dot = l.row(i).slice(ndarray::s![..j]).dot(&head);
            l[[i, j]] = (a[[i, j]] - dot) / d;
        }
    }
    Some(l)
}

/// Solve `L L^T x = b` for a lower-triangular `L`
fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut z = b.clone();
    for i in 0..n {
        let acc: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (z[i] - acc) / l[[i, i]];
    }
    for i in (0..n).rev() {
        let acc: f64 = ((i + 1)..n).map(|k| l[[k, i]] * z[k]).sum();
        z[i] = (z[i] - acc) / l[[i, i]];
    }
    z
}

/// Gaussian elimination with partial pivoting on `[A | b]`
fn gaussian_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut m = a.clone();
    let mut rhs = b.clone();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))?;
        if m[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                m.swap([col, k], [pivot, k]);
            }
            rhs.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let acc: f64 = ((i + 1)..n).map(|k| m[[i, k]] * x[k]).sum();
        x[i] = (rhs[i] - acc) / m[[i, i]];
    }
    Some(x)
}

/// Solve (X^T X + penalty * I) w = X^T y.
///
/// Tries Cholesky, then Cholesky with a small relative diagonal boost, then
/// pivoted elimination.
fn solve_normal_equations(x: &Array2<f64>, y: &Array1<f64>, penalty: f64) -> Result<Array1<f64>> {
    let mut gram = x.t().dot(x);
    gram.diag_mut().mapv_inplace(|d| d + penalty);
    let xty = x.t().dot(y);

    if let Some(l) = cholesky(&gram) {
        return Ok(cholesky_substitute(&l, &xty));
    }

    let n = gram.nrows().max(1) as f64;
    let boost = 1e-8 * (gram.diag().iter().map(|v| v.abs()).sum::<f64>() / n).max(1e-12);
    let mut boosted = gram.clone();
    boosted.diag_mut().mapv_inplace(|d| d + boost);
    if let Some(l) = cholesky(&boosted) {
        return Ok(cholesky_substitute(&l, &xty));
    }

    gaussian_solve(&gram, &xty).ok_or_else(|| {
        ScorecastError::ComputationError(
            "normal equations are singular, cannot solve least squares".to_string(),
        )
    })
}

/// Centered copies of the data plus the means needed to recover the intercept
struct Centered {
    x: Array2<f64>,
    y: Array1<f64>,
    x_mean: Option<Array1<f64>>,
    y_mean: f64,
}

fn center(x: &Array2<f64>, y: &Array1<f64>, fit_intercept: bool) -> Centered {
    if !fit_intercept {
        return Centered {
            x: x.clone(),
            y: y.clone(),
            x_mean: None,
            y_mean: 0.0,
        };
    }
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.mean().unwrap_or(0.0);
    Centered {
        x: x - &x_mean.view().insert_axis(Axis(0)),
        y: y - y_mean,
        x_mean: Some(x_mean),
        y_mean,
    }
}

fn intercept_for(centered: &Centered, coefficients: &Array1<f64>) -> f64 {
    match &centered.x_mean {
        Some(x_mean) => centered.y_mean - coefficients.dot(x_mean),
        None => 0.0,
    }
}

fn linear_predict(
    coefficients: Option<&Array1<f64>>,
    intercept: f64,
    x: &Array2<f64>,
) -> Result<Array1<f64>> {
    let coefficients = coefficients.ok_or(ScorecastError::ModelNotFitted)?;
    check_predict_width(x, coefficients.len())?;
    Ok(x.dot(coefficients) + intercept)
}

/// Ordinary least squares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: f64,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let centered = center(x, y, self.fit_intercept);

        let gram_scale = centered
            .x
            .columns()
            .into_iter()
            .map(|c| c.dot(&c))
            .sum::<f64>()
            / x.ncols().max(1) as f64;
        let coefficients =
            solve_normal_equations(&centered.x, &centered.y, OLS_JITTER * gram_scale.max(1.0))?;

        self.intercept = intercept_for(&centered, &coefficients);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(self.coefficients.as_ref(), self.intercept, x)
    }
}

/// Ridge Regression (L2-regularized linear regression)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    pub fit_intercept: bool,
    /// L2 regularization strength
    pub alpha: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            alpha,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if !(self.alpha >= 0.0) {
            return Err(ScorecastError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        let centered = center(x, y, self.fit_intercept);
        let coefficients = solve_normal_equations(&centered.x, &centered.y, self.alpha)?;

        self.intercept = intercept_for(&centered, &coefficients);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(self.coefficients.as_ref(), self.intercept, x)
    }
}

/// Lasso Regression (L1-regularized via coordinate descent)
///
/// Minimizes `1/(2n) * ||y - Xw||² + alpha * ||w||₁`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    pub fit_intercept: bool,
    /// L1 regularization strength
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LassoRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            alpha,
            max_iter: 1000,
            tol: 1e-6,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Soft-threshold operator for the L1 proximal step
    fn soft_threshold(val: f64, threshold: f64) -> f64 {
        if val > threshold {
            val - threshold
        } else if val < -threshold {
            val + threshold
        } else {
            0.0
        }
    }
}

impl Regressor for LassoRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if !(self.alpha >= 0.0) {
            return Err(ScorecastError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let centered = center(x, y, self.fit_intercept);
        let x_c = &centered.x;

        let col_norms: Vec<f64> = (0..n_features)
            .map(|j| x_c.column(j).mapv(|v| v * v).sum())
            .collect();

        let mut w = Array1::<f64>::zeros(n_features);
        let mut r = centered.y.clone();
        let lambda = self.alpha * n_samples as f64;

        for _ in 0..self.max_iter {
            let mut max_step = 0.0f64;
            for j in 0..n_features {
                if col_norms[j] < 1e-15 {
                    w[j] = 0.0;
                    continue;
                }
                let old_wj = w[j];
                let rho = x_c.column(j).dot(&r) + col_norms[j] * old_wj;
                w[j] = Self::soft_threshold(rho, lambda) / col_norms[j];

                let delta = old_wj - w[j];
                if delta != 0.0 {
                    r.scaled_add(delta, &x_c.column(j));
                    max_step = max_step.max(delta.abs());
                }
            }
            if max_step < self.tol {
                break;
            }
        }

        self.intercept = intercept_for(&centered, &w);
        self.coefficients = Some(w);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(self.coefficients.as_ref(), self.intercept, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        let x = array![[1.0, 1.0], [2.0, 1.0], [1.0, 2.0], [2.0, 2.0], [3.0, 1.0],];
        // y = 2*x1 + 3*x2 + 1
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        assert!(model.is_fitted());
        let r2 = model.score(&x, &y).unwrap();
        assert!(r2 > 0.99, "R² should be close to 1, got {}", r2);
        assert!((model.intercept - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_regression_rank_deficient() {
        // Two complementary indicator columns, as produced by one-hot encoding
        let x = array![[1.0, 0.0, 1.0], [0.0, 1.0, 2.0], [1.0, 0.0, 3.0], [0.0, 1.0, 4.0]];
        let y = array![3.0, 6.0, 7.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let r2 = model.score(&x, &y).unwrap();
        assert!(r2 > 0.99, "R² = {}", r2);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearRegression::new();
        let err = model.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, ScorecastError::ModelNotFitted));
    }

    #[test]
    fn test_predict_wrong_width() {
        let mut model = LinearRegression::new();
        model.fit(&array![[1.0], [2.0], [3.0]], &array![1.0, 2.0, 3.0]).unwrap();
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ScorecastError::ShapeError { .. }));
    }

    #[test]
    fn test_ridge_regression() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = RidgeRegression::new(0.1);
        model.fit(&x, &y).unwrap();
        let r2 = model.score(&x, &y).unwrap();
        assert!(r2 > 0.95, "Ridge R² = {}", r2);
    }

    #[test]
    fn test_ridge_shrinks_with_alpha() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut weak = RidgeRegression::new(0.1);
        let mut strong = RidgeRegression::new(10.0);
        weak.fit(&x, &y).unwrap();
        strong.fit(&x, &y).unwrap();
        let w_weak = weak.coefficients.as_ref().unwrap()[0];
        let w_strong = strong.coefficients.as_ref().unwrap()[0];
        assert!(w_strong.abs() < w_weak.abs());
    }

    #[test]
    fn test_lasso_regression() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LassoRegression::new(0.01);
        model.fit(&x, &y).unwrap();
        let r2 = model.score(&x, &y).unwrap();
        assert!(r2 > 0.9, "Lasso R² = {}", r2);
        // Constant column gets no weight
        assert_eq!(model.coefficients.as_ref().unwrap()[1], 0.0);
    }

    #[test]
    fn test_lasso_large_alpha_zeroes_weights() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LassoRegression::new(100.0);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.coefficients.as_ref().unwrap()[0], 0.0);
        assert!((model.intercept - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let mut model = RidgeRegression::new(-1.0);
        let err = model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ScorecastError::InvalidParameter { .. }));
    }
}
