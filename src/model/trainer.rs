//! Score model training and inference
//!
//! Splits labelled wallets into train/test partitions, standardizes with
//! statistics from the training partition only, fits the boosted ensemble
//! against `credit_score_target` and evaluates on the held-out wallets.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::error::Result;
use crate::export::WalletScore;
use crate::model::boosting::GradientBoostingRegressor;
use crate::model::metrics::{mean_absolute_error, root_mean_squared_error, RegressionMetrics};
use crate::model::scaler::StandardScaler;
use crate::model::split::train_test_split;
use crate::wallet::aggregate::WalletFeatures;
use crate::wallet::label::{LabeledWallet, MAX_SCORE};

/// Clip a raw model output into the score range
pub fn clip_score(value: f64) -> f64 {
    value.clamp(0.0, MAX_SCORE)
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: RegressionMetrics,
}

/// Fitted scaler and ensemble
#[derive(Debug, Clone)]
pub struct TrainedModel {
    scaler: StandardScaler,
    model: GradientBoostingRegressor,
}

impl TrainedModel {
    /// Predicted credit score for one wallet, in [0, 1000]
    pub fn predict_score(&self, features: &WalletFeatures) -> f64 {
        let row = self.scaler.transform_row(&features.feature_vector());
        clip_score(self.model.predict_row(&row))
    }

    /// Score every wallet, preserving order
    pub fn score(&self, wallets: &[LabeledWallet]) -> Vec<WalletScore> {
        wallets
            .iter()
            .map(|w| WalletScore {
                user_wallet: w.features.user_wallet.clone(),
                credit_score: self.predict_score(&w.features),
            })
            .collect()
    }
}

/// Fit the score model on labelled wallets
pub fn train(wallets: &[LabeledWallet], config: &TrainingConfig) -> Result<(TrainedModel, TrainingReport)> {
    let features: Vec<Vec<f64>> = wallets.iter().map(|w| w.features.feature_vector()).collect();
    let targets: Vec<f64> = wallets.iter().map(|w| w.credit_score_target).collect();

    let split = train_test_split(wallets.len(), config.test_fraction, config.seed)?;
    debug!(
        "Split {} wallets: {} train, {} test (seed={})",
        wallets.len(),
        split.train.len(),
        split.test.len(),
        config.seed
    );

    let pick = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        indices
            .iter()
            .map(|&i| (features[i].clone(), targets[i]))
            .unzip()
    };
    let (x_train_raw, y_train) = pick(&split.train);
    let (x_test_raw, y_test) = pick(&split.test);

    let scaler = StandardScaler::fit(&x_train_raw)?;
    let x_train = scaler.transform(&x_train_raw);
    let x_test = scaler.transform(&x_test_raw);

    let model = GradientBoostingRegressor::fit(&x_train, &y_train, &config.boosting, config.seed)?;

    let r2 = model.score(&x_test, &y_test);
    let clipped: Vec<f64> = model.predict(&x_test).into_iter().map(clip_score).collect();
    let metrics = RegressionMetrics {
        r2,
        rmse: root_mean_squared_error(&y_test, &clipped),
        mae: mean_absolute_error(&y_test, &clipped),
    };
    info!(
        "Model trained: R^2={:.4}, RMSE={:.2}, MAE={:.2}",
        metrics.r2, metrics.rmse, metrics.mae
    );

    let report = TrainingReport {
        train_size: split.train.len(),
        test_size: split.test.len(),
        metrics,
    };
    Ok((TrainedModel { scaler, model }, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::wallet::label::{label_wallet, LabelRules};

    fn wallet(i: usize) -> LabeledWallet {
        let liquidated = i % 4 == 0;
        let features = WalletFeatures {
            user_wallet: format!("0x{:04}", i),
            num_deposits: (i % 5) as u32 + 1,
            num_borrows: 1,
            num_repayments: 1,
            num_liquidations: liquidated as u32,
            total_amount_usd: 300.0 + i as f64,
            total_deposited_usd: 200.0 + i as f64,
            total_borrowed_usd: 50.0,
            total_repaid_usd: 50.0,
            unique_days_active: (i % 7) as u32 + 1,
            borrow_to_deposit_ratio: 50.0 / (200.0 + i as f64),
            repayment_to_borrow_ratio: 1.0,
        };
        label_wallet(features, &LabelRules::default())
    }

    #[test]
    fn test_train_and_score_all_wallets() {
        let wallets: Vec<LabeledWallet> = (0..40).map(wallet).collect();
        let (model, report) = train(&wallets, &TrainingConfig::default()).unwrap();

        assert_eq!(report.train_size, 32);
        assert_eq!(report.test_size, 8);
        assert!(report.metrics.rmse >= 0.0);
        assert!(report.metrics.mae <= report.metrics.rmse + 1e-9);

        let scores = model.score(&wallets);
        assert_eq!(scores.len(), 40);
        assert!(scores.iter().all(|s| (0.0..=1000.0).contains(&s.credit_score)));

        // Liquidated wallets are perfectly separable on num_liquidations
        assert!(scores[0].credit_score < 100.0);
        assert!(scores[1].credit_score > 900.0);
    }

    #[test]
    fn test_training_is_reproducible() {
        let wallets: Vec<LabeledWallet> = (0..25).map(wallet).collect();
        let (_, a) = train(&wallets, &TrainingConfig::default()).unwrap();
        let (_, b) = train(&wallets, &TrainingConfig::default()).unwrap();
        assert_eq!(a.metrics.rmse, b.metrics.rmse);
        assert_eq!(a.metrics.mae, b.metrics.mae);
        assert!(a.metrics.r2 == b.metrics.r2 || (a.metrics.r2.is_nan() && b.metrics.r2.is_nan()));
    }

    #[test]
    fn test_single_wallet_cannot_train() {
        let err = train(&[wallet(1)], &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_clip_score() {
        assert_eq!(clip_score(-12.0), 0.0);
        assert_eq!(clip_score(1000.5), 1000.0);
        assert_eq!(clip_score(640.0), 640.0);
    }
}
