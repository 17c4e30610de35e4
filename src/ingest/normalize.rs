//! Amount normalization
//!
//! Raw on-chain amounts are integers scaled by the token's decimals. This
//! module turns each flattened record into a typed [`Transaction`] with the
//! human-scale token quantity and its USD value.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ingest::loader::FlatRecord;

// Flattened input column names
pub const FIELD_WALLET: &str = "userWallet";
pub const FIELD_ACTION: &str = "action";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_ASSET_SYMBOL: &str = "actionData_assetSymbol";
pub const FIELD_AMOUNT: &str = "actionData_amount";
pub const FIELD_PRICE_USD: &str = "actionData_assetPriceUSD";

/// Columns at least one record must carry
pub const REQUIRED_FIELDS: [&str; 6] = [
    FIELD_WALLET,
    FIELD_ACTION,
    FIELD_TIMESTAMP,
    FIELD_ASSET_SYMBOL,
    FIELD_AMOUNT,
    FIELD_PRICE_USD,
];

/// Token symbol to decimal places lookup
#[derive(Debug, Clone)]
pub struct TokenDecimals {
    table: HashMap<String, u32>,
    default_decimals: u32,
}

impl Default for TokenDecimals {
    fn default() -> Self {
        let mut table = Self::empty(18);
        table.insert("USDC", 6);
        table.insert("DAI", 18);
        table.insert("WETH", 18);
        table.insert("WMATIC", 18);
        table
    }
}

impl TokenDecimals {
    /// Table with no entries, every lookup falls back to `default_decimals`
    pub fn empty(default_decimals: u32) -> Self {
        Self {
            table: HashMap::new(),
            default_decimals,
        }
    }

    pub fn insert(&mut self, symbol: &str, decimals: u32) {
        self.table.insert(symbol.to_string(), decimals);
    }

    /// Decimals for `symbol`, exact (case-sensitive) match
    pub fn decimals_for(&self, symbol: &str) -> u32 {
        self.table
            .get(symbol)
            .copied()
            .unwrap_or(self.default_decimals)
    }

    /// Convert a raw integer amount into token units
    pub fn token_amount(&self, symbol: &str, raw_amount: f64) -> f64 {
        raw_amount / 10f64.powi(self.decimals_for(symbol) as i32)
    }
}

/// A single normalized lending-protocol transaction
#[derive(Debug, Clone)]
pub struct Transaction {
    pub user_wallet: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub asset_symbol: String,
    pub raw_amount: f64,
    pub token_amount: f64,
    pub asset_price_usd: f64,
    pub amount_usd: f64,
    /// `ln(1 + amount_usd)`, set once the transaction survives filtering
    pub log_amount_usd: Option<f64>,
}

impl Transaction {
    /// Build a transaction from the flattened record at position `index`.
    ///
    /// Wallet, action and timestamp must be present. An absent or null
    /// amount or price becomes NaN, and an absent or null symbol is looked
    /// up as an unknown token, so such a record carries a NaN `amount_usd`
    /// and is dropped by [`filter_positive`](crate::ingest::filter_positive).
    /// Liquidation records, which report collateral and principal amounts
    /// instead, take this path.
    pub fn from_record(index: usize, record: &FlatRecord, tokens: &TokenDecimals) -> Result<Self> {
        let user_wallet = required_text(index, record, FIELD_WALLET)?;
        let action = required_text(index, record, FIELD_ACTION)?;
        let timestamp = parse_timestamp(index, required(index, record, FIELD_TIMESTAMP)?)?;

        let asset_symbol = match record.get(FIELD_ASSET_SYMBOL) {
            None | Some(Value::Null) => String::new(),
            Some(value) => value_text(value),
        };

        let raw_amount = optional_number(index, record, FIELD_AMOUNT)?;
        let asset_price_usd = optional_number(index, record, FIELD_PRICE_USD)?;

        let token_amount = tokens.token_amount(&asset_symbol, raw_amount);
        let amount_usd = token_amount * asset_price_usd;

        Ok(Self {
            user_wallet,
            action,
            timestamp,
            asset_symbol,
            raw_amount,
            token_amount,
            asset_price_usd,
            amount_usd,
            log_amount_usd: None,
        })
    }
}

/// Normalize every record, failing on the first malformed one.
///
/// A column that no record carries at all is reported as missing on the
/// first record.
pub fn normalize_records(records: &[FlatRecord], tokens: &TokenDecimals) -> Result<Vec<Transaction>> {
    if !records.is_empty() {
        if let Some(field) = REQUIRED_FIELDS
            .iter()
            .find(|field| records.iter().all(|r| r.get(field).is_none()))
        {
            return Err(Error::MissingField {
                index: 0,
                field: field.to_string(),
            });
        }
    }

    records
        .iter()
        .enumerate()
        .map(|(index, record)| Transaction::from_record(index, record, tokens))
        .collect()
}

fn required<'a>(index: usize, record: &'a FlatRecord, field: &str) -> Result<&'a Value> {
    record.get(field).ok_or_else(|| Error::MissingField {
        index,
        field: field.to_string(),
    })
}

fn required_text(index: usize, record: &FlatRecord, field: &str) -> Result<String> {
    match required(index, record, field)? {
        Value::Null => Err(Error::MissingField {
            index,
            field: field.to_string(),
        }),
        value => Ok(value_text(value)),
    }
}

fn optional_number(index: usize, record: &FlatRecord, field: &str) -> Result<f64> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(f64::NAN),
        Some(value) => parse_number(index, field, value),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn conversion_error(index: usize, field: &str, value: &Value, reason: &str) -> Error {
    Error::Conversion {
        index,
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Accepts JSON numbers and numeric strings ("2000000000", "1.0e3", " 0.99 ")
fn parse_number(index: usize, field: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| conversion_error(index, field, value, "number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| conversion_error(index, field, value, "not a number")),
        _ => Err(conversion_error(index, field, value, "expected a number or numeric string")),
    }
}

fn parse_timestamp(index: usize, value: &Value) -> Result<DateTime<Utc>> {
    let seconds = parse_number(index, FIELD_TIMESTAMP, value)?;
    if !seconds.is_finite() {
        return Err(conversion_error(index, FIELD_TIMESTAMP, value, "not a finite number"));
    }

    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .ok_or_else(|| conversion_error(index, FIELD_TIMESTAMP, value, "timestamp out of range"))
}
