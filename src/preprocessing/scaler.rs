//! Feature scaling

use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaling: `(x - mean) / std`, or `x / std` without centering.
///
/// Standard deviation is the population one; constant columns keep scale 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    with_mean: bool,
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            with_mean: true,
            mean: None,
            scale: None,
        }
    }

    /// Scale only, leaving sparse-style one-hot zeros at zero
    pub fn without_mean() -> Self {
        Self {
            with_mean: false,
            ..Self::new()
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.scale.is_some()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(ScorecastError::PreprocessingError(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ScorecastError::PreprocessingError("empty input".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(ScorecastError::ModelNotFitted),
        };
        if x.ncols() != scale.len() {
            return Err(ScorecastError::ShapeError {
                expected: format!("{} columns", scale.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.to_owned();
        if self.with_mean {
            out -= mean;
        }
        out /= scale;
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0], [4.0, 10.0], [5.0, 10.0]];
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();

        let col = out.column(0);
        assert!(col.mean().unwrap().abs() < 1e-12);
        assert!((col.std(0.0) - 1.0).abs() < 1e-12);
        // constant column: centered, scale 1
        assert!(out.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_without_mean_keeps_zeros() {
        let x = array![[0.0], [1.0], [0.0], [1.0]];
        let mut scaler = StandardScaler::without_mean();
        let out = scaler.fit_transform(&x).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert!((out[[1, 0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_checked() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
        assert!(matches!(
            StandardScaler::new().transform(&array![[1.0]]),
            Err(ScorecastError::ModelNotFitted)
        ));
    }
}
