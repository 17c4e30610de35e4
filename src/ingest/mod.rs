//! Transaction ingestion
//!
//! Loading, amount normalization and filtering of raw lending-protocol
//! transaction records:
//! - `loader`: JSON array to flattened records
//! - `normalize`: token decimals and USD conversion
//! - `filter`: drop non-positive USD values

pub mod filter;
pub mod loader;
pub mod normalize;

pub use filter::{filter_positive, FilterOutcome};
pub use loader::{load_records, parse_records, FlatRecord};
pub use normalize::{normalize_records, TokenDecimals, Transaction};
