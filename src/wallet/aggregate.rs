//! Per-wallet behavioural aggregation

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::ingest::normalize::Transaction;

// Action values counted by the aggregator (exact match)
pub const ACTION_DEPOSIT: &str = "deposit";
pub const ACTION_BORROW: &str = "borrow";
pub const ACTION_REPAY: &str = "repay";
pub const ACTION_LIQUIDATION: &str = "liquidationcall";

/// Model input columns, in feature-vector order
pub const FEATURE_NAMES: [&str; 10] = [
    "num_deposits",
    "num_borrows",
    "num_repayments",
    "num_liquidations",
    "total_deposited_usd",
    "total_borrowed_usd",
    "total_repaid_usd",
    "unique_days_active",
    "borrow_to_deposit_ratio",
    "repayment_to_borrow_ratio",
];

/// Aggregated behaviour of a single wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletFeatures {
    #[serde(rename = "userWallet")]
    pub user_wallet: String,
    pub num_deposits: u32,
    pub num_borrows: u32,
    pub num_repayments: u32,
    pub num_liquidations: u32,
    pub total_amount_usd: f64,
    pub total_deposited_usd: f64,
    pub total_borrowed_usd: f64,
    pub total_repaid_usd: f64,
    pub unique_days_active: u32,
    pub borrow_to_deposit_ratio: f64,
    pub repayment_to_borrow_ratio: f64,
}

impl WalletFeatures {
    /// Feature vector in [`FEATURE_NAMES`] order, non-finite values as 0
    pub fn feature_vector(&self) -> Vec<f64> {
        [
            self.num_deposits as f64,
            self.num_borrows as f64,
            self.num_repayments as f64,
            self.num_liquidations as f64,
            self.total_deposited_usd,
            self.total_borrowed_usd,
            self.total_repaid_usd,
            self.unique_days_active as f64,
            self.borrow_to_deposit_ratio,
            self.repayment_to_borrow_ratio,
        ]
        .into_iter()
        .map(|v| if v.is_finite() { v } else { 0.0 })
        .collect()
    }
}

/// Running totals for one wallet while scanning transactions
#[derive(Default)]
struct Accumulator {
    num_deposits: u32,
    num_borrows: u32,
    num_repayments: u32,
    num_liquidations: u32,
    total_amount_usd: f64,
    total_deposited_usd: f64,
    total_borrowed_usd: f64,
    total_repaid_usd: f64,
    active_days: HashSet<NaiveDate>,
}

impl Accumulator {
    fn add(&mut self, tx: &Transaction) {
        self.total_amount_usd += tx.amount_usd;
        self.active_days.insert(tx.timestamp.date_naive());

        match tx.action.as_str() {
            ACTION_DEPOSIT => {
                self.num_deposits += 1;
                self.total_deposited_usd += tx.amount_usd;
            }
            ACTION_BORROW => {
                self.num_borrows += 1;
                self.total_borrowed_usd += tx.amount_usd;
            }
            ACTION_REPAY => {
                self.num_repayments += 1;
                self.total_repaid_usd += tx.amount_usd;
            }
            ACTION_LIQUIDATION => self.num_liquidations += 1,
            _ => {}
        }
    }

    fn finish(self, user_wallet: String) -> WalletFeatures {
        WalletFeatures {
            user_wallet,
            num_deposits: self.num_deposits,
            num_borrows: self.num_borrows,
            num_repayments: self.num_repayments,
            num_liquidations: self.num_liquidations,
            total_amount_usd: self.total_amount_usd,
            total_deposited_usd: self.total_deposited_usd,
            total_borrowed_usd: self.total_borrowed_usd,
            total_repaid_usd: self.total_repaid_usd,
            unique_days_active: self.active_days.len() as u32,
            borrow_to_deposit_ratio: ratio(self.total_borrowed_usd, self.total_deposited_usd),
            repayment_to_borrow_ratio: ratio(self.total_repaid_usd, self.total_borrowed_usd),
        }
    }
}

/// Divide, substituting 1 for a denominator that is exactly zero
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    numerator / denominator
}

/// Group transactions by wallet, ordered by wallet address
pub fn aggregate_wallets(transactions: &[Transaction]) -> Vec<WalletFeatures> {
    let mut wallets: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for tx in transactions {
        wallets.entry(tx.user_wallet.as_str()).or_default().add(tx);
    }

    wallets
        .into_iter()
        .map(|(wallet, acc)| acc.finish(wallet.to_string()))
        .collect()
}
