//! Hyperparameter grids and the combinations they expand to

use crate::error::{Result, ScorecastError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    /// Explicit "no value", e.g. unbounded tree depth
    None,
}

impl ParamValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::None => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::None => write!(f, "None"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<Option<i64>> for ParamValue {
    fn from(v: Option<i64>) -> Self {
        v.map_or(ParamValue::None, ParamValue::Int)
    }
}

/// One point of a grid: parameter name -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet(BTreeMap<String, ParamValue>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reject any parameter name outside `allowed`
    pub fn ensure_only(&self, allowed: &[&str]) -> Result<()> {
        match self.0.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(unknown) => Err(ScorecastError::InvalidParameter {
                name: unknown.clone(),
                value: self.0[unknown].to_string(),
                reason: format!("not a parameter of this model (expected one of {:?})", allowed),
            }),
            None => Ok(()),
        }
    }

    /// Float parameter, `default` when absent
    pub fn float_or(&self, name: &str, default: f64) -> Result<f64> {
        match self.0.get(name) {
            None => Ok(default),
            Some(v) => v.as_float().ok_or_else(|| type_error(name, v, "a number")),
        }
    }

    /// Positive integer parameter, `default` when absent
    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize> {
        match self.0.get(name) {
            None => Ok(default),
            Some(v) => match v.as_int() {
                Some(i) if i > 0 => Ok(i as usize),
                _ => Err(type_error(name, v, "a positive integer")),
            },
        }
    }

    /// Optional positive integer; `ParamValue::None` or absence gives `None`
    pub fn opt_usize(&self, name: &str) -> Result<Option<usize>> {
        match self.0.get(name) {
            None | Some(ParamValue::None) => Ok(None),
            Some(v) => match v.as_int() {
                Some(i) if i > 0 => Ok(Some(i as usize)),
                _ => Err(type_error(name, v, "a positive integer or None")),
            },
        }
    }
}

fn type_error(name: &str, value: &ParamValue, expected: &str) -> ScorecastError {
    ScorecastError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: format!("expected {}", expected),
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}

/// Finite hyperparameter grid: parameter name -> ordered candidate values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid(BTreeMap<String, Vec<ParamValue>>);

impl ParamGrid {
    /// The empty grid expands to a single empty combination
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter axis
    pub fn param<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.0
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of combinations the grid expands to
    pub fn n_combinations(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Cartesian product in a fixed order: names sorted, last name varies fastest
    pub fn combinations(&self) -> Vec<ParamSet> {
        let axes: Vec<(&String, &Vec<ParamValue>)> = self.0.iter().collect();
        let total = self.n_combinations();
        let mut out = Vec::with_capacity(total);

        for flat in 0..total {
            let mut rest = flat;
            let mut set = BTreeMap::new();
            for (name, values) in axes.iter().rev() {
                set.insert((*name).clone(), values[rest % values.len()].clone());
                rest /= values.len();
            }
            out.push(ParamSet(set));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid_has_one_combination() {
        let grid = ParamGrid::new();
        let combos = grid.combinations();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_enumeration_order() {
        let grid = ParamGrid::new()
            .param("n_estimators", [100i64, 200])
            .param("learning_rate", [0.01, 0.1, 0.3]);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 6);

        // "learning_rate" sorts first, "n_estimators" varies fastest
        let rendered: Vec<String> = combos.iter().map(ToString::to_string).collect();
        assert_eq!(rendered[0], "{learning_rate=0.01, n_estimators=100}");
        assert_eq!(rendered[1], "{learning_rate=0.01, n_estimators=200}");
        assert_eq!(rendered[2], "{learning_rate=0.1, n_estimators=100}");
        assert_eq!(rendered[5], "{learning_rate=0.3, n_estimators=200}");
    }

    #[test]
    fn test_empty_axis_has_no_combinations() {
        let grid = ParamGrid::new().param("alpha", Vec::<f64>::new());
        assert!(grid.combinations().is_empty());
    }

    #[test]
    fn test_typed_accessors() {
        let set = ParamSet::new()
            .with("alpha", 0.5)
            .with("max_depth", None::<i64>)
            .with("n_neighbors", 3i64);
        assert_eq!(set.float_or("alpha", 1.0).unwrap(), 0.5);
        assert_eq!(set.float_or("missing", 1.0).unwrap(), 1.0);
        assert_eq!(set.opt_usize("max_depth").unwrap(), None);
        assert_eq!(set.usize_or("n_neighbors", 5).unwrap(), 3);
        assert!(set.usize_or("alpha", 5).is_err());
    }

    #[test]
    fn test_unknown_name_rejected() {
        let set = ParamSet::new().with("gamma", 1.0);
        let err = set.ensure_only(&["alpha"]).unwrap_err();
        assert!(matches!(err, ScorecastError::InvalidParameter { .. }));
    }
}
