//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

// Re-export stage configs that live next to the code using them
pub use crate::model::boosting::BoostingParams;
pub use crate::wallet::label::LabelRules;

use crate::ingest::normalize::TokenDecimals;

/// Largest decimal count an on-chain uint256 amount can carry
const MAX_TOKEN_DECIMALS: u32 = 77;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
    #[serde(default)]
    pub labeling: LabelRules,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// JSON array of transaction records
    #[serde(default = "default_input_path")]
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Destination of the `userWallet,credit_score` table
    #[serde(default = "default_scores_path")]
    pub scores_path: String,
    /// Optional per-wallet feature dump
    #[serde(default)]
    pub features_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scores_path: default_scores_path(),
            features_path: None,
        }
    }
}

/// One row of the token decimals table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenDecimalEntry {
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Decimals assumed for symbols missing from the table
    #[serde(default = "default_token_decimals")]
    pub default_decimals: u32,
    #[serde(default = "default_token_table")]
    pub decimals: Vec<TokenDecimalEntry>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_decimals: default_token_decimals(),
            decimals: default_token_table(),
        }
    }
}

impl TokenConfig {
    /// Build the lookup table used by the amount normalizer
    pub fn to_table(&self) -> TokenDecimals {
        let mut table = TokenDecimals::empty(self.default_decimals);
        for entry in &self.decimals {
            table.insert(&entry.symbol, entry.decimals);
        }
        table
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Share of wallets held out for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed for the split permutation and row subsampling
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            boosting: BoostingParams::default(),
        }
    }
}

// Default value functions
fn default_input_path() -> String {
    "user-wallet-transactions.json".to_string()
}

fn default_scores_path() -> String {
    "wallet_scores.csv".to_string()
}

fn default_token_decimals() -> u32 {
    18
}

fn default_token_table() -> Vec<TokenDecimalEntry> {
    [("USDC", 6), ("DAI", 18), ("WETH", 18), ("WMATIC", 18)]
        .into_iter()
        .map(|(symbol, decimals)| TokenDecimalEntry {
            symbol: symbol.to_string(),
            decimals,
        })
        .collect()
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SCORER__)
            .add_source(
                config::Environment::with_prefix("SCORER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.input.path.trim().is_empty() {
            anyhow::bail!("input.path must not be empty");
        }
        if self.output.scores_path.trim().is_empty() {
            anyhow::bail!("output.scores_path must not be empty");
        }

        // Token table
        if self.tokens.default_decimals > MAX_TOKEN_DECIMALS {
            anyhow::bail!(
                "tokens.default_decimals cannot exceed {}, got {}",
                MAX_TOKEN_DECIMALS,
                self.tokens.default_decimals
            );
        }
        let mut seen = HashSet::new();
        for entry in &self.tokens.decimals {
            if entry.decimals > MAX_TOKEN_DECIMALS {
                anyhow::bail!(
                    "Token {} has {} decimals, maximum is {}",
                    entry.symbol,
                    entry.decimals,
                    MAX_TOKEN_DECIMALS
                );
            }
            if !seen.insert(entry.symbol.as_str()) {
                anyhow::bail!("Duplicate token symbol in decimals table: {}", entry.symbol);
            }
        }

        // Training
        let fraction = self.training.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            anyhow::bail!("training.test_fraction must be in (0, 1), got {}", fraction);
        }
        self.training
            .boosting
            .validate()
            .context("Invalid training.boosting settings")?;

        if !self.labeling.max_borrow_to_deposit.is_finite()
            || !self.labeling.min_repayment_to_borrow.is_finite()
        {
            anyhow::bail!("labeling thresholds must be finite numbers");
        }

        Ok(())
    }

    /// Render the effective configuration for display
    pub fn summary(&self) -> String {
        let tokens = self
            .tokens
            .decimals
            .iter()
            .map(|t| format!("{}={}", t.symbol, t.decimals))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"Configuration:
  Input:
    path: {}
  Output:
    scores: {}
    features: {}
  Tokens:
    decimals: {}
    default: {}
  Labeling:
    liquidation rule: num_liquidations > 0
    borrow/deposit: > {}
    repayment/borrow: < {}
    skip repayment rule without borrows: {}
  Training:
    test_fraction: {}
    seed: {}
    n_estimators: {}
    learning_rate: {}
    max_depth: {}
    min_samples_split: {}
    min_samples_leaf: {}
    subsample: {}
"#,
            self.input.path,
            self.output.scores_path,
            self.output.features_path.as_deref().unwrap_or("(disabled)"),
            tokens,
            self.tokens.default_decimals,
            self.labeling.max_borrow_to_deposit,
            self.labeling.min_repayment_to_borrow,
            self.labeling.skip_repayment_rule_without_borrows,
            self.training.test_fraction,
            self.training.seed,
            self.training.boosting.n_estimators,
            self.training.boosting.learning_rate,
            self.training.boosting.max_depth,
            self.training.boosting.min_samples_split,
            self.training.boosting.min_samples_leaf,
            self.training.boosting.subsample,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            tokens: TokenConfig::default(),
            labeling: LabelRules::default(),
            training: TrainingConfig::default(),
        }
    }
}
