//! Positive-value transaction filter

use tracing::debug;

use crate::ingest::normalize::Transaction;

/// Result of filtering a batch of transactions
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub transactions: Vec<Transaction>,
    pub before: usize,
}

impl FilterOutcome {
    pub fn after(&self) -> usize {
        self.transactions.len()
    }

    pub fn dropped(&self) -> usize {
        self.before - self.after()
    }
}

/// Keep transactions with a strictly positive USD value and fill in
/// `log_amount_usd` for each survivor.
///
/// Zero, negative and NaN values are dropped without individual reporting.
pub fn filter_positive(transactions: Vec<Transaction>) -> FilterOutcome {
    let before = transactions.len();

    let transactions: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| tx.amount_usd > 0.0)
        .map(|mut tx| {
            tx.log_amount_usd = Some(tx.amount_usd.ln_1p());
            tx
        })
        .collect();

    debug!(
        "Filtered transactions: {} kept, {} dropped",
        transactions.len(),
        before - transactions.len()
    );

    FilterOutcome {
        transactions,
        before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn tx(amount_usd: f64) -> Transaction {
        Transaction {
            user_wallet: "0xw".into(),
            action: "deposit".into(),
            timestamp: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            asset_symbol: "USDC".into(),
            raw_amount: amount_usd * 1e6,
            token_amount: amount_usd,
            asset_price_usd: 1.0,
            amount_usd,
            log_amount_usd: None,
        }
    }

    #[test]
    fn test_drops_non_positive_values() {
        let outcome = filter_positive(vec![tx(10.0), tx(0.0), tx(-3.0), tx(f64::NAN), tx(1e-9)]);

        assert_eq!(outcome.before, 5);
        assert_eq!(outcome.after(), 2);
        assert_eq!(outcome.dropped(), 3);
        assert!(outcome.transactions.iter().all(|t| t.amount_usd > 0.0));
    }

    #[test]
    fn test_log_amount_is_log1p() {
        let outcome = filter_positive(vec![tx(std::f64::consts::E - 1.0)]);
        let log = outcome.transactions[0].log_amount_usd.unwrap();
        assert!((log - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let outcome = filter_positive(Vec::new());
        assert_eq!(outcome.before, 0);
        assert_eq!(outcome.after(), 0);
    }
}
