//! Wallet Credit Score Library
//!
//! Batch credit scoring for lending-protocol wallets: aggregates on-chain
//! transaction history per wallet, derives a heuristic risk label and fits
//! a gradient-boosted regression model that scores wallets from 0 to 1000.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{run, PipelineReport};
