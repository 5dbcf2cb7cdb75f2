//! Named hyperparameters and their search grid.

use crate::config::ModelFamily;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One hyperparameter combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Hyperparameters(BTreeMap<String, f64>);

impl Hyperparameters {
    /// Set a value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Value of `name` for `family`, failing when absent.
    pub fn require(&self, name: &str, family: ModelFamily) -> Result<f64> {
        self.get(name).ok_or_else(|| Error::HyperparameterMissing {
            name: name.to_string(),
            family: family.to_string(),
        })
    }

    /// Value of `name` as a count, or `default` when absent.
    ///
    /// Counts must be finite and non-negative; fractional values are rounded.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn count_or(&self, name: &str, default: usize) -> Result<usize> {
        match self.get(name) {
            None => Ok(default),
            Some(value) if value.is_finite() && value >= 0.0 => Ok(value.round() as usize),
            Some(value) => Err(Error::InvalidHyperparameter {
                name: name.to_string(),
                value,
                reason: "must be a non-negative count".to_string(),
            }),
        }
    }

    /// Iterate over `(name, value)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Hyperparameters {
    fn from(pairs: [(&str, f64); N]) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

/// Cartesian product of named value lists.
///
/// Names are ordered alphabetically; the last name varies fastest, so the
/// enumeration order is stable for a given configuration.
#[derive(Debug, Clone, Default)]
pub struct HyperparameterGrid {
    axes: BTreeMap<String, Vec<f64>>,
}

impl HyperparameterGrid {
    /// Build a grid from named value lists.
    pub fn new(axes: BTreeMap<String, Vec<f64>>) -> Self {
        Self { axes }
    }

    /// Number of combinations.
    pub fn len(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.values().map(Vec::len).product()
    }

    /// Whether the grid has no combinations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination, in grid order.
    pub fn combinations(&self) -> Vec<Hyperparameters> {
        let mut out = vec![Hyperparameters::default()];
        for (name, values) in &self.axes {
            out = out
                .into_iter()
                .flat_map(|base| {
                    values.iter().map(move |&v| {
                        let mut next = base.clone();
                        next.insert(name.clone(), v);
                        next
                    })
                })
                .collect();
        }
        if self.axes.is_empty() { Vec::new() } else { out }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_order_last_name_fastest() {
        let mut axes = BTreeMap::new();
        axes.insert("lambda".to_string(), vec![0.1, 0.2]);
        axes.insert("alpha".to_string(), vec![0.0, 1.0]);
        let grid = HyperparameterGrid::new(axes);

        let combos = grid.combinations();
        assert_eq!(grid.len(), 4);
        assert_eq!(combos.len(), 4);
        assert_eq!(combos[0], Hyperparameters::from([("alpha", 0.0), ("lambda", 0.1)]));
        assert_eq!(combos[1], Hyperparameters::from([("alpha", 0.0), ("lambda", 0.2)]));
        assert_eq!(combos[3], Hyperparameters::from([("alpha", 1.0), ("lambda", 0.2)]));
    }

    #[test]
    fn test_empty_grid() {
        let grid = HyperparameterGrid::default();
        assert!(grid.is_empty());
        assert!(grid.combinations().is_empty());
    }

    #[test]
    fn test_display_and_lookup() {
        let params = Hyperparameters::from([("mtry", 61.0), ("trees", 100.0)]);
        assert_eq!(params.to_string(), "mtry=61, trees=100");
        assert_eq!(params.count_or("trees", 5).unwrap(), 100);
        assert_eq!(params.count_or("max_depth", 0).unwrap(), 0);
        assert_eq!(params.get("alpha"), None);
        assert!(params.require("alpha", ModelFamily::Logistic).is_err());
    }

    #[test]
    fn test_negative_count_rejected() {
        let params = Hyperparameters::from([("trees", -1.0)]);
        assert!(matches!(
            params.count_or("trees", 10),
            Err(Error::InvalidHyperparameter { .. })
        ));
    }
}
