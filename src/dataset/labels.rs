//! Enumerated class labels and the binary collapse rule.

use crate::constants::dataset::{BACKGROUND_LABEL, DRONE_LABEL};
use serde::Serialize;

/// Ordered set of class names; labels are indices into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Build a label set from names in label order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The binary view: `drone` (positive, index 0) and `background`.
    pub fn binary() -> Self {
        Self::new([DRONE_LABEL, BACKGROUND_LABEL])
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set has no classes.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class names in label order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of a label index.
    pub fn name(&self, label: usize) -> &str {
        self.names.get(label).map_or("?", String::as_str)
    }

    /// Label index of a class name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Map every native label to its binary label.
///
/// `background_class` maps to `background`; every other class maps to `drone`.
pub fn binary_collapse(native: &LabelSet, background_class: &str) -> Vec<usize> {
    let binary = LabelSet::binary();
    let drone = binary.index_of(DRONE_LABEL).unwrap_or(0);
    let background = binary.index_of(BACKGROUND_LABEL).unwrap_or(1);

    native
        .names()
        .iter()
        .map(|name| {
            if name == background_class {
                background
            } else {
                drone
            }
        })
        .collect()
}
