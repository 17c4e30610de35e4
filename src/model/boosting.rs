//! Gradient-boosted regression trees (squared-error loss)
//!
//! Starts from the target mean and adds `n_estimators` shallow trees, each
//! fit to the current residuals and shrunk by `learning_rate`. With
//! `subsample < 1.0` every stage fits on a random subset of rows drawn
//! from a seeded ChaCha RNG, so a given seed always yields the same model.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::metrics::r2_score;
use crate::model::tree::{RegressionTree, TreeParams};

/// Boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Shrinkage applied to every tree's contribution
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// Fraction of rows each stage is fit on, in (0, 1]
    #[serde(default = "default_subsample")]
    pub subsample: f64,
}

fn default_n_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    3
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_subsample() -> f64 {
    1.0
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            subsample: default_subsample(),
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::Config("n_estimators must be at least 1".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(Error::Config("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::Config("min_samples_leaf must be at least 1".into()));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(Error::Config(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

/// Fitted boosted ensemble
#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    /// Fit on feature rows `x` against targets `y`
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &BoostingParams, seed: u64) -> Result<Self> {
        params.validate()?;

        if x.is_empty() {
            return Err(Error::InsufficientData("cannot fit on zero samples".into()));
        }
        if x.len() != y.len() {
            return Err(Error::Model(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        let width = x[0].len();
        if x.iter().any(|row| row.len() != width) {
            return Err(Error::Model("feature rows differ in width".into()));
        }

        let n = x.len();
        let init = y.iter().sum::<f64>() / n as f64;
        let tree_params = params.tree_params();
        let n_inbag = ((params.subsample * n as f64) as usize).max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut predictions = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let all_rows: Vec<usize> = (0..n).collect();

        for _ in 0..params.n_estimators {
            for i in 0..n {
                residuals[i] = y[i] - predictions[i];
            }

            let rows = if n_inbag < n {
                let mut sample = rand::seq::index::sample(&mut rng, n, n_inbag).into_vec();
                sample.sort_unstable();
                sample
            } else {
                all_rows.clone()
            };

            let tree = RegressionTree::fit(x, &residuals, &rows, &tree_params);
            for (pred, row) in predictions.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        let train_mse = y
            .iter()
            .zip(&predictions)
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n as f64;
        debug!(
            "Fitted {} trees on {} samples (init={:.4}, train MSE={:.4})",
            trees.len(),
            n,
            init,
            train_mse
        );

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.init, |acc, tree| acc + self.learning_rate * tree.predict(row))
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Coefficient of determination of unclipped predictions
    pub fn score(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        r2_score(y, &self.predict(x))
    }

    #[cfg(test)]
    pub(crate) fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[cfg(test)]
    pub(crate) fn init_prediction(&self) -> f64 {
        self.init
    }
}
