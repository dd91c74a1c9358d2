//! Bagged regression forest
//!
//! Each tree is grown on a bootstrap resample of the training rows with its
//! own generator seeded from `seed + tree_index`, so a fit is fully
//! reproducible. Predictions average the trees.

mod tree;

pub use self::tree::{RegressionTree, TreeParams};

use biochamber_common::{TrainingDataError, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use self::tree::Dataset;

/// Ensemble construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), TrainingDataError> {
        if self.n_trees == 0 {
            return Err(TrainingDataError::InvalidParameter(
                "n_trees must be at least 1".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(TrainingDataError::InvalidParameter(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(TrainingDataError::InvalidParameter(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(TrainingDataError::InvalidParameter(
                "max_features must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

/// Fitted ensemble
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    label_range: (f64, f64),
}

impl RandomForest {
    /// Fit on a feature matrix and matching labels
    pub fn fit(
        features: &[[f64; FEATURE_COUNT]],
        labels: &[f64],
        params: &ForestParams,
    ) -> Result<Self, TrainingDataError> {
        params.validate()?;
        if features.is_empty() {
            return Err(TrainingDataError::Empty);
        }
        if features.len() != labels.len() {
            return Err(TrainingDataError::InvalidParameter(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        for (row, x) in features.iter().enumerate() {
            if let Some(column) = x.iter().position(|v| !v.is_finite()) {
                return Err(TrainingDataError::NonFiniteFeature { row, column });
            }
        }
        if let Some(row) = labels.iter().position(|y| !y.is_finite()) {
            return Err(TrainingDataError::NonFiniteLabel { row });
        }

        let data = Dataset { features, labels };
        let tree_params = params.tree_params();
        let n = features.len();

        let trees = (0..params.n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let rows: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(&data, rows, &tree_params, &mut rng)
            })
            .collect();

        let label_range = labels
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| {
                (lo.min(y), hi.max(y))
            });

        Ok(Self { trees, label_range })
    }

    /// Mean of the tree predictions
    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Smallest and largest training label
    pub fn label_range(&self) -> (f64, f64) {
        self.label_range
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (Vec<[f64; 4]>, Vec<f64>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = i as f64 / 4.0;
            features.push([x, 0.0, 0.0, (i % 5) as f64]);
            labels.push((-(x - 5.0).powi(2) / 4.0).exp());
        }
        (features, labels)
    }

    #[test]
    fn test_fit_and_predict() {
        let (features, labels) = grid();
        let forest = RandomForest::fit(&features, &labels, &ForestParams::default()).unwrap();

        assert_eq!(forest.n_trees(), 50);
        let peak = forest.predict(&[5.0, 0.0, 0.0, 2.0]);
        let tail = forest.predict(&[0.0, 0.0, 0.0, 2.0]);
        assert!(peak > 0.8, "peak = {}", peak);
        assert!(tail < 0.1, "tail = {}", tail);
    }

    #[test]
    fn test_deterministic() {
        let (features, labels) = grid();
        let a = RandomForest::fit(&features, &labels, &ForestParams::default()).unwrap();
        let b = RandomForest::fit(&features, &labels, &ForestParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_prediction_within_label_range() {
        let (features, labels) = grid();
        let forest = RandomForest::fit(&features, &labels, &ForestParams::default()).unwrap();
        let (lo, hi) = forest.label_range();
        for x in [-100.0, 0.3, 4.9, 7.7, 1e6] {
            let y = forest.predict(&[x, 0.0, 0.0, 0.0]);
            assert!(y >= lo - 1e-12 && y <= hi + 1e-12);
        }
    }

    #[test]
    fn test_without_bootstrap_memorises() {
        let (features, labels) = grid();
        let params = ForestParams {
            n_trees: 3,
            bootstrap: false,
            ..Default::default()
        };
        let forest = RandomForest::fit(&features, &labels, &params).unwrap();
        for (x, y) in features.iter().zip(&labels) {
            assert!((forest.predict(x) - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_max_depth_applies_to_every_tree() {
        let (features, labels) = grid();
        let params = ForestParams {
            n_trees: 8,
            max_depth: Some(3),
            ..Default::default()
        };
        let forest = RandomForest::fit(&features, &labels, &params).unwrap();
        assert_eq!(forest.trees().len(), 8);
        for tree in forest.trees() {
            assert!(tree.depth() <= 3);
            assert!(tree.leaf_count() <= 8);
        }
    }

    #[test]
    fn test_feature_subsampling() {
        let (features, labels) = grid();
        let params = ForestParams {
            max_features: Some(2),
            ..Default::default()
        };
        let forest = RandomForest::fit(&features, &labels, &params).unwrap();
        let y = forest.predict(&[5.0, 0.0, 0.0, 0.0]);
        assert!((0.0..=1.0).contains(&y));
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = ForestParams::default();
        assert_eq!(
            RandomForest::fit(&[], &[], &params).unwrap_err(),
            TrainingDataError::Empty
        );
        assert_eq!(
            RandomForest::fit(&[[1.0, f64::NAN, 0.0, 0.0]], &[0.5], &params).unwrap_err(),
            TrainingDataError::NonFiniteFeature { row: 0, column: 1 }
        );
        assert_eq!(
            RandomForest::fit(&[[1.0; 4]], &[f64::INFINITY], &params).unwrap_err(),
            TrainingDataError::NonFiniteLabel { row: 0 }
        );
        assert!(RandomForest::fit(&[[1.0; 4]], &[0.5, 0.5], &params).is_err());
    }

    #[test]
    fn test_rejects_bad_params() {
        let (features, labels) = grid();
        let zero_trees = ForestParams {
            n_trees: 0,
            ..Default::default()
        };
        assert!(matches!(
            RandomForest::fit(&features, &labels, &zero_trees),
            Err(TrainingDataError::InvalidParameter(_))
        ));
        let tiny_split = ForestParams {
            min_samples_split: 1,
            ..Default::default()
        };
        assert!(tiny_split.validate().is_err());
    }
}
