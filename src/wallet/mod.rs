//! Wallet-level features and pseudo-labels

pub mod aggregate;
pub mod label;

pub use aggregate::{aggregate_wallets, WalletFeatures, FEATURE_NAMES};
pub use label::{label_wallets, LabelRules, LabelSummary, LabeledWallet};
