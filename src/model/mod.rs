//! Score model
//!
//! - `scaler`: feature standardization
//! - `split`: seeded train/test partition
//! - `tree` / `boosting`: gradient-boosted regression trees
//! - `metrics`: R², RMSE, MAE
//! - `trainer`: wires the above into fit, evaluate and score

pub mod boosting;
pub mod metrics;
pub mod scaler;
pub mod split;
pub mod trainer;
pub mod tree;

pub use boosting::{BoostingParams, GradientBoostingRegressor};
pub use metrics::RegressionMetrics;
pub use trainer::{train, TrainedModel, TrainingReport};
