//! CSV output of wallet scores and features

use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::wallet::label::LabeledWallet;

/// Final score for one wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletScore {
    #[serde(rename = "userWallet")]
    pub user_wallet: String,
    pub credit_score: f64,
}

/// One row of the optional feature dump
#[derive(Debug, Serialize)]
struct FeatureRow<'a> {
    #[serde(rename = "userWallet")]
    user_wallet: &'a str,
    num_deposits: u32,
    num_borrows: u32,
    num_repayments: u32,
    num_liquidations: u32,
    total_amount_usd: f64,
    total_deposited_usd: f64,
    total_borrowed_usd: f64,
    total_repaid_usd: f64,
    unique_days_active: u32,
    borrow_to_deposit_ratio: f64,
    repayment_to_borrow_ratio: f64,
    risk_label: u8,
    credit_score_target: f64,
    credit_score: f64,
}

fn create(path: &Path) -> Result<csv::Writer<File>> {
    let file = File::create(path)
        .map_err(|e| Error::Io(format!("failed to create {}: {}", path.display(), e)))?;
    Ok(csv::Writer::from_writer(file))
}

/// Write `userWallet,credit_score` rows, replacing any existing file
pub fn write_scores<P: AsRef<Path>>(path: P, scores: &[WalletScore]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;

    if scores.is_empty() {
        // serde only emits the header alongside the first record
        writer.write_record(["userWallet", "credit_score"])?;
    }
    for score in scores {
        writer.serialize(score)?;
    }
    writer.flush()?;

    debug!("Wrote {} scores to {}", scores.len(), path.display());
    Ok(())
}

/// Write aggregate features, labels and final scores per wallet.
///
/// `wallets` and `scores` must be in the same order.
pub fn write_features<P: AsRef<Path>>(path: P, wallets: &[LabeledWallet], scores: &[WalletScore]) -> Result<()> {
    if wallets.len() != scores.len() {
        return Err(Error::Csv(format!(
            "{} wallets but {} scores",
            wallets.len(),
            scores.len()
        )));
    }

    let path = path.as_ref();
    let mut writer = create(path)?;
    for (wallet, score) in wallets.iter().zip(scores) {
        let f = &wallet.features;
        if f.user_wallet != score.user_wallet {
            return Err(Error::Csv(format!(
                "wallet order mismatch: {} vs {}",
                f.user_wallet, score.user_wallet
            )));
        }
        writer.serialize(FeatureRow {
            user_wallet: &f.user_wallet,
            num_deposits: f.num_deposits,
            num_borrows: f.num_borrows,
            num_repayments: f.num_repayments,
            num_liquidations: f.num_liquidations,
            total_amount_usd: f.total_amount_usd,
            total_deposited_usd: f.total_deposited_usd,
            total_borrowed_usd: f.total_borrowed_usd,
            total_repaid_usd: f.total_repaid_usd,
            unique_days_active: f.unique_days_active,
            borrow_to_deposit_ratio: f.borrow_to_deposit_ratio,
            repayment_to_borrow_ratio: f.repayment_to_borrow_ratio,
            risk_label: wallet.risk_label,
            credit_score_target: wallet.credit_score_target,
            credit_score: score.credit_score,
        })?;
    }
    writer.flush()?;

    debug!("Wrote {} feature rows to {}", wallets.len(), path.display());
    Ok(())
}
