//! End-to-end scoring run
//!
//! load → normalize → filter → aggregate → label → train → score → export,
//! each stage completing before the next starts.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{write_features, write_scores, WalletScore};
use crate::ingest::{filter_positive, load_records, normalize_records};
use crate::model::{train, RegressionMetrics};
use crate::wallet::{aggregate_wallets, label_wallets, LabelSummary};

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub transactions_loaded: usize,
    pub transactions_retained: usize,
    pub wallets: usize,
    pub labels: LabelSummary,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: RegressionMetrics,
    pub scores_path: PathBuf,
    pub features_path: Option<PathBuf>,
    #[serde(skip)]
    pub scores: Vec<WalletScore>,
}

/// Run the full pipeline with the given configuration
pub fn run(config: &Config) -> Result<PipelineReport> {
    let tokens = config.tokens.to_table();

    let records = load_records(&config.input.path)?;
    let transactions_loaded = records.len();
    info!("Loaded {} transactions from {}", transactions_loaded, config.input.path);

    let transactions = normalize_records(&records, &tokens)?;
    drop(records);

    let filtered = filter_positive(transactions);
    info!(
        "Remaining after zero-check: {} transactions ({} dropped)",
        filtered.after(),
        filtered.dropped()
    );
    if filtered.transactions.is_empty() {
        return Err(Error::InsufficientData(
            "no transactions with a positive USD value".into(),
        ));
    }

    let wallets = aggregate_wallets(&filtered.transactions);
    info!("Wallets aggregated: {}", wallets.len());

    let labeled = label_wallets(wallets, &config.labeling);
    let labels = LabelSummary::from_wallets(&labeled);
    info!(
        "Labelled wallets: {} low risk, {} high risk",
        labels.low_risk, labels.high_risk
    );
    if labels.is_single_class() {
        warn!("All wallets share one risk label; the model will predict a constant score");
    }

    let (model, training) = train(&labeled, &config.training)?;
    let scores = model.score(&labeled);

    let scores_path = PathBuf::from(&config.output.scores_path);
    write_scores(&scores_path, &scores)?;
    info!("Saved {} wallet scores to {}", scores.len(), scores_path.display());

    let features_path = config.output.features_path.as_ref().map(PathBuf::from);
    if let Some(path) = &features_path {
        write_features(path, &labeled, &scores)?;
        info!("Saved wallet features to {}", path.display());
    }

    Ok(PipelineReport {
        transactions_loaded,
        transactions_retained: filtered.after(),
        wallets: labeled.len(),
        labels,
        train_size: training.train_size,
        test_size: training.test_size,
        metrics: training.metrics,
        scores_path,
        features_path,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const DAY: i64 = 86_400;

    fn tx(wallet: &str, action: &str, ts: i64, amount: &str, symbol: &str, price: &str) -> Value {
        json!({
            "_id": { "$oid": format!("{}-{}", wallet, ts) },
            "userWallet": wallet,
            "network": "polygon",
            "protocol": "aave_v2",
            "action": action,
            "timestamp": ts,
            "actionData": {
                "type": action,
                "amount": amount,
                "assetSymbol": symbol,
                "assetPriceUSD": price
            }
        })
    }

    /// Twenty wallets: every fourth one liquidated, the rest healthy borrowers
    fn dataset() -> Vec<Value> {
        let mut txs = Vec::new();
        for i in 0..20i64 {
            let wallet = format!("0xwallet{:02}", i);
            let base = 1_600_000_000 + i * DAY;
            txs.push(tx(&wallet, "deposit", base, &format!("{}000000", 1000 + i * 10), "USDC", "1.0"));
            txs.push(tx(&wallet, "borrow", base + DAY, "100000000000000000000", "DAI", "1.0"));
            txs.push(tx(&wallet, "repay", base + 2 * DAY, "80000000000000000000", "DAI", "1.0"));
            if i % 4 == 0 {
                txs.push(tx(&wallet, "liquidationcall", base + 3 * DAY, "1000000000000000", "WETH", "2000"));
            }
        }
        // Zero-value rows are dropped before aggregation
        txs.push(tx("0xwallet00", "deposit", 1_600_000_000, "0", "USDC", "1.0"));
        txs.push(tx("0xwallet01", "deposit", 1_600_000_000, "5", "USDC", "0"));
        txs
    }

    fn config_for(dir: &std::path::Path, txs: &[Value]) -> Config {
        let input = dir.join("user-wallet-transactions.json");
        std::fs::write(&input, serde_json::to_string(txs).unwrap()).unwrap();

        let mut config = Config::default();
        config.input.path = input.display().to_string();
        config.output.scores_path = dir.join("wallet_scores.csv").display().to_string();
        config
    }

    #[test]
    fn test_end_to_end_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path(), &dataset());
        config.output.features_path = Some(dir.path().join("features.csv").display().to_string());

        let report = run(&config).unwrap();
        assert_eq!(report.transactions_loaded, 67);
        assert_eq!(report.transactions_retained, 65);
        assert_eq!(report.wallets, 20);
        assert_eq!(report.labels, LabelSummary { low_risk: 15, high_risk: 5 });
        assert_eq!(report.train_size, 16);
        assert_eq!(report.test_size, 4);

        let csv = std::fs::read_to_string(&report.scores_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("userWallet,credit_score"));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 20);
        for row in rows {
            let (_, score) = row.split_once(',').unwrap();
            let score: f64 = score.parse().unwrap();
            assert!((0.0..=1000.0).contains(&score));
        }

        let features = std::fs::read_to_string(report.features_path.unwrap()).unwrap();
        assert_eq!(features.lines().count(), 21);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), &dataset());

        let first = run(&config).unwrap();
        let second = run(&config).unwrap();
        assert_eq!(first.scores, second.scores);
        assert_eq!(first.metrics.rmse, second.metrics.rmse);
        assert_eq!(first.metrics.mae, second.metrics.mae);
    }

    fn stages(txs: &[Value]) -> Vec<crate::wallet::LabeledWallet> {
        let records = crate::ingest::parse_records(&serde_json::to_string(txs).unwrap()).unwrap();
        let transactions = normalize_records(&records, &crate::ingest::TokenDecimals::default()).unwrap();
        let filtered = filter_positive(transactions);
        label_wallets(aggregate_wallets(&filtered.transactions), &Default::default())
    }

    #[test]
    fn test_single_usdc_deposit_wallet() {
        let txs = [tx("0xsolo", "deposit", 1_600_000_000, "1000000", "USDC", "1.00")];
        let records = crate::ingest::parse_records(&serde_json::to_string(&txs).unwrap()).unwrap();
        let transactions = normalize_records(&records, &crate::ingest::TokenDecimals::default()).unwrap();
        assert!((transactions[0].token_amount - 1.0).abs() < 1e-12);
        assert!((transactions[0].amount_usd - 1.0).abs() < 1e-12);

        let wallets = stages(&txs);
        let w = &wallets[0].features;
        assert_eq!(w.num_deposits, 1);
        assert_eq!(w.num_borrows, 0);
        assert_eq!(w.borrow_to_deposit_ratio, 0.0);
        // No borrows means a repayment ratio of 0/1, which trips the repayment rule
        assert_eq!(w.repayment_to_borrow_ratio, 0.0);
        assert_eq!(wallets[0].risk_label, 1);
    }

    #[test]
    fn test_liquidation_wallet_targets_zero() {
        let wallets = stages(&[
            tx("0xliq", "deposit", 1_600_000_000, "5000000000", "USDC", "1.0"),
            tx("0xliq", "borrow", 1_600_000_100, "1000000000000000000", "DAI", "1.0"),
            tx("0xliq", "repay", 1_600_000_200, "1000000000000000000", "DAI", "1.0"),
            tx("0xliq", "liquidationcall", 1_600_000_300, "1", "WETH", "1.0"),
        ]);
        assert_eq!(wallets[0].features.num_liquidations, 1);
        assert_eq!(wallets[0].risk_label, 1);
        assert_eq!(wallets[0].credit_score_target, 0.0);
    }

    #[test]
    fn test_all_zero_values_is_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(
            dir.path(),
            &[tx("0xa", "deposit", 1_600_000_000, "0", "USDC", "1.0")],
        );
        assert!(matches!(run(&config), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.input.path = dir.path().join("absent.json").display().to_string();
        assert!(matches!(run(&config), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_bad_amount_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(
            dir.path(),
            &[tx("0xa", "deposit", 1_600_000_000, "12abc", "USDC", "1.0")],
        );
        assert!(matches!(run(&config), Err(Error::Conversion { .. })));
        assert!(!dir.path().join("wallet_scores.csv").exists());
    }
}
