//! Random forest of CART classification trees.
//!
//! Every tree is grown on a bootstrap sample of the rows. At each node
//! `mtry` features are drawn without replacement and the split minimizing
//! weighted Gini impurity is kept. Leaves store class frequencies and the
//! forest averages them. Trees are grown in parallel, each from its own seed.

use super::{Hyperparameters, Learner, Model, check_prediction_input, check_training_input};
use crate::config::ModelFamily;
use crate::constants::learner::{FOREST_MIN_NODE_SIZE, FOREST_TREES};
use crate::dataset::derive_seed;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Random forest learner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForestLearner;

/// Fitted forest.
#[derive(Debug, Clone)]
pub struct ForestModel {
    trees: Vec<Tree>,
    n_features: usize,
    n_classes: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn leaf_for(&self, row: ArrayView1<'_, f32>) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Settings for growing one tree.
#[derive(Debug, Clone, Copy)]
struct GrowSettings {
    n_classes: usize,
    mtry: usize,
    min_node_size: usize,
    max_depth: usize,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f32>,
    y: &'a [usize],
    settings: GrowSettings,
    rng: StdRng,
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

impl TreeBuilder<'_> {
    fn grow(mut self, rows: Vec<usize>) -> Tree {
        self.build(rows, 0);
        Tree { nodes: self.nodes }
    }

    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&rows);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.settings.max_depth > 0 && depth >= self.settings.max_depth;

        if pure || depth_reached || rows.len() <= self.settings.min_node_size.max(1) {
            return self.push_leaf(&counts, rows.len());
        }

        let Some(split) = self.best_split(&rows, &counts) else {
            return self.push_leaf(&counts, rows.len());
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| self.x[[r, split.feature]] <= split.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.push_leaf(&counts, rows.len());
        }

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    #[allow(clippy::cast_precision_loss)]
    fn push_leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let total = total.max(1) as f64;
        self.nodes.push(Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        });
        self.nodes.len() - 1
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.settings.n_classes];
        for &r in rows {
            counts[self.y[r]] += 1;
        }
        counts
    }

    /// Best Gini split over `mtry` random features, if any reduces impurity.
    fn best_split(&mut self, rows: &[usize], counts: &[usize]) -> Option<SplitCandidate> {
        let n = rows.len();
        let parent = weighted_gini(counts, n);
        let features = rand::seq::index::sample(&mut self.rng, self.x.ncols(), self.settings.mtry);

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f32, usize)> = Vec::with_capacity(n);
        let mut left = vec![0_usize; self.settings.n_classes];
        let mut right = vec![0_usize; self.settings.n_classes];

        for feature in features.iter() {
            pairs.clear();
            pairs.extend(rows.iter().map(|&r| (self.x[[r, feature]], self.y[r])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            left.fill(0);
            right.copy_from_slice(counts);
            for i in 1..n {
                let (prev_value, prev_label) = pairs[i - 1];
                left[prev_label] += 1;
                right[prev_label] -= 1;

                let value = pairs[i].0;
                if value <= prev_value {
                    continue;
                }

                let impurity = weighted_gini(&left, i) + weighted_gini(&right, n - i);
                let improves = impurity < parent - 1e-12;
                let better = best.as_ref().is_none_or(|b| impurity < b.impurity);
                if improves && better {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: split_threshold(prev_value, value),
                        impurity,
                    });
                }
            }
        }

        best
    }
}

/// Midpoint between two sorted distinct values, kept strictly below `upper`.
///
/// For adjacent floats the midpoint rounds up to `upper`, which would send
/// every row to the left child.
fn split_threshold(lower: f32, upper: f32) -> f32 {
    let mid = lower + (upper - lower) / 2.0;
    if mid < upper { mid } else { lower }
}

/// Node size times Gini impurity: `n - Σ c² / n`.
#[allow(clippy::cast_precision_loss)]
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let sum_sq: f64 = counts.iter().map(|&c| (c as f64) * (c as f64)).sum();
    n - sum_sq / n
}

impl Model for ForestModel {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>> {
        check_prediction_input(x, self.n_features)?;
        let n_trees = self.trees.len().max(1) as f64;

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (row, mut out) in x.rows().into_iter().zip(proba.rows_mut()) {
            for tree in &self.trees {
                for (slot, &p) in out.iter_mut().zip(tree.leaf_for(row)) {
                    *slot += p;
                }
            }
            out /= n_trees;
        }
        Ok(proba)
    }
}

impl Learner for ForestLearner {
    fn family(&self) -> ModelFamily {
        ModelFamily::Forest
    }

    fn fit(
        &self,
        x: &Array2<f32>,
        y: &[usize],
        n_classes: usize,
        params: &Hyperparameters,
        seed: u64,
    ) -> Result<Box<dyn Model>> {
        check_training_input(x, y, n_classes)?;

        let mtry_value = params.require("mtry", ModelFamily::Forest)?;
        let mtry = params.count_or("mtry", 0)?;
        if mtry == 0 {
            return Err(Error::InvalidHyperparameter {
                name: "mtry".to_string(),
                value: mtry_value,
                reason: "must be at least 1".to_string(),
            });
        }
        let trees = params.count_or("trees", FOREST_TREES)?;
        if trees == 0 {
            return Err(Error::InvalidHyperparameter {
                name: "trees".to_string(),
                value: 0.0,
                reason: "must be at least 1".to_string(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::ModelFit {
                reason: "non-finite feature values".to_string(),
            });
        }

        let settings = GrowSettings {
            n_classes,
            mtry: mtry.min(x.ncols()),
            min_node_size: params.count_or("min_node_size", FOREST_MIN_NODE_SIZE)?,
            max_depth: params.count_or("max_depth", 0)?,
        };

        let n = x.nrows();
        let grown: Vec<Tree> = (0..trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(derive_seed(seed, &[t as u64]));
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                TreeBuilder {
                    x,
                    y,
                    settings,
                    rng,
                    nodes: Vec::new(),
                }
                .grow(rows)
            })
            .collect();

        Ok(Box::new(ForestModel {
            trees: grown,
            n_features: x.ncols(),
            n_classes,
        }))
    }
}
