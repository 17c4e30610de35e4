//! Heuristic risk labelling
//!
//! No ground-truth creditworthiness exists in the transaction ledger, so
//! each wallet gets a binary pseudo-label from three rules, evaluated in
//! order. A rule can only raise the label from 0 to 1:
//! 1. any liquidation
//! 2. borrowed / deposited above `max_borrow_to_deposit`
//! 3. repaid / borrowed below `min_repayment_to_borrow`
//!
//! The label maps to a hard regression target of 1000 (low risk) or 0.

use serde::{Deserialize, Serialize};

use crate::wallet::aggregate::WalletFeatures;

/// Target score for a wallet with no risk flags
pub const MAX_SCORE: f64 = 1000.0;

/// Label rule thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRules {
    #[serde(default = "default_max_borrow_to_deposit")]
    pub max_borrow_to_deposit: f64,

    #[serde(default = "default_min_repayment_to_borrow")]
    pub min_repayment_to_borrow: f64,

    /// Skip the repayment rule for wallets that never borrowed. Off by
    /// default, in which case a zero-borrow wallet has a repayment ratio of
    /// 0 and is flagged.
    #[serde(default)]
    pub skip_repayment_rule_without_borrows: bool,
}

fn default_max_borrow_to_deposit() -> f64 {
    1.5
}

fn default_min_repayment_to_borrow() -> f64 {
    0.5
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            max_borrow_to_deposit: default_max_borrow_to_deposit(),
            min_repayment_to_borrow: default_min_repayment_to_borrow(),
            skip_repayment_rule_without_borrows: false,
        }
    }
}

impl LabelRules {
    /// 1 if any rule flags the wallet as risky, else 0
    pub fn risk_label(&self, wallet: &WalletFeatures) -> u8 {
        let mut label = 0;

        if wallet.num_liquidations > 0 {
            label = 1;
        }
        if wallet.borrow_to_deposit_ratio > self.max_borrow_to_deposit {
            label = 1;
        }
        let repayment_rule_applies =
            !(self.skip_repayment_rule_without_borrows && wallet.total_borrowed_usd == 0.0);
        if repayment_rule_applies && wallet.repayment_to_borrow_ratio < self.min_repayment_to_borrow {
            label = 1;
        }

        label
    }
}

/// Wallet features with the derived pseudo-label
#[derive(Debug, Clone)]
pub struct LabeledWallet {
    pub features: WalletFeatures,
    pub risk_label: u8,
    pub credit_score_target: f64,
}

impl LabeledWallet {
    pub fn is_high_risk(&self) -> bool {
        self.risk_label == 1
    }
}

/// Label a single wallet
pub fn label_wallet(features: WalletFeatures, rules: &LabelRules) -> LabeledWallet {
    let risk_label = rules.risk_label(&features);
    LabeledWallet {
        features,
        risk_label,
        credit_score_target: (1 - risk_label) as f64 * MAX_SCORE,
    }
}

/// Label every wallet, preserving order
pub fn label_wallets(wallets: Vec<WalletFeatures>, rules: &LabelRules) -> Vec<LabeledWallet> {
    wallets
        .into_iter()
        .map(|w| label_wallet(w, rules))
        .collect()
}

/// Label distribution across a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelSummary {
    pub low_risk: usize,
    pub high_risk: usize,
}

impl LabelSummary {
    pub fn from_wallets(wallets: &[LabeledWallet]) -> Self {
        let high_risk = wallets.iter().filter(|w| w.is_high_risk()).count();
        Self {
            low_risk: wallets.len() - high_risk,
            high_risk,
        }
    }

    /// True when every wallet carries the same label
    pub fn is_single_class(&self) -> bool {
        self.low_risk == 0 || self.high_risk == 0
    }
}
