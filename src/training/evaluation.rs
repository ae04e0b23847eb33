//! Test-set scoring of searched candidates and winner selection

use super::models::Regressor;
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Candidate name -> test-set R², in the order candidates were evaluated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    entries: Vec<(String, f64)>,
}

impl EvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a score; names are unique within a report
    pub fn push(&mut self, name: impl Into<String>, score: f64) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ScorecastError::ConfigError(format!(
                "duplicate candidate '{}' in evaluation report",
                name
            )));
        }
        self.entries.push((name, score));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| *s)
    }

    /// Highest score; the earliest entry wins a tie
    pub fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, score) in &self.entries {
            if best.map_or(true, |(_, b)| *score > b) {
                best = Some((name.as_str(), *score));
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }
}

/// Score every fitted candidate on the test set.
///
/// Candidates whose prediction fails or whose R² is not finite are left out of
/// the report and returned alongside it with the reason.
pub fn evaluate_models<M: Regressor>(
    models: &[(String, M)],
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<(EvaluationReport, Vec<(String, String)>)> {
    let mut report = EvaluationReport::new();
    let mut excluded = Vec::new();

    for (name, model) in models {
        match model.score(x_test, y_test) {
            Ok(score) if score.is_finite() => report.push(name.clone(), score)?,
            Ok(score) => {
                warn!(candidate = %name, score, "Non-finite test score, excluding");
                excluded.push((name.clone(), format!("non-finite test R² ({})", score)));
            }
            Err(e) => {
                warn!(candidate = %name, error = %e, "Prediction failed, excluding");
                excluded.push((name.clone(), e.to_string()));
            }
        }
    }

    Ok((report, excluded))
}

/// Pick the winner and apply the quality gate; a score equal to the threshold passes
pub fn select_best(report: &EvaluationReport, threshold: f64) -> Result<(String, f64)> {
    let (name, score) = report.best().ok_or(ScorecastError::NoCandidates)?;
    if score < threshold {
        return Err(ScorecastError::BelowThreshold {
            model: name.to_string(),
            score,
            threshold,
        });
    }
    Ok((name.to_string(), score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::linear_models::LinearRegression;
    use ndarray::array;

    fn report(entries: &[(&str, f64)]) -> EvaluationReport {
        let mut r = EvaluationReport::new();
        for (n, s) in entries {
            r.push(*n, *s).unwrap();
        }
        r
    }

    #[test]
    fn test_select_highest() {
        let r = report(&[("a", 0.7), ("b", 0.9), ("c", 0.8)]);
        assert_eq!(select_best(&r, 0.6).unwrap(), ("b".to_string(), 0.9));

        let reversed = report(&[("c", 0.8), ("b", 0.9), ("a", 0.7)]);
        assert_eq!(select_best(&reversed, 0.6).unwrap().0, "b");
    }

    #[test]
    fn test_tie_goes_to_first() {
        let r = report(&[("x", 0.8), ("y", 0.8)]);
        assert_eq!(select_best(&r, 0.6).unwrap().0, "x");
    }

    #[test]
    fn test_gate_boundary() {
        let r = report(&[("only", 0.6)]);
        assert!(select_best(&r, 0.6).is_ok());

        let r = report(&[("only", 0.6 - 1e-9)]);
        match select_best(&r, 0.6) {
            Err(ScorecastError::BelowThreshold { model, threshold, .. }) => {
                assert_eq!(model, "only");
                assert_eq!(threshold, 0.6);
            }
            other => panic!("expected BelowThreshold, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_report() {
        let err = select_best(&EvaluationReport::new(), 0.6).unwrap_err();
        assert!(matches!(err, ScorecastError::NoCandidates));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut r = EvaluationReport::new();
        r.push("a", 0.1).unwrap();
        assert!(r.push("a", 0.2).is_err());
    }

    #[test]
    fn test_unfitted_model_excluded() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let mut fitted = LinearRegression::new();
        fitted.fit(&x, &y).unwrap();
        let models = vec![
            ("fitted".to_string(), fitted),
            ("unfitted".to_string(), LinearRegression::new()),
        ];
        let (report, excluded) = evaluate_models(&models, &x, &y).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.get("fitted").unwrap() > 0.999);
        assert_eq!(excluded[0].0, "unfitted");
    }
}
