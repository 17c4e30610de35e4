//! Wallet Credit Scorer - batch credit scores for lending-protocol wallets
//!
//! Reads a JSON ledger of deposit/borrow/repay/liquidation transactions and
//! writes a `userWallet,credit_score` CSV with scores in [0, 1000].

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use wallet_credit_score::cli::commands;
use wallet_credit_score::config::Config;

/// Wallet Credit Scorer - score lending-protocol wallets from transaction history
#[derive(Parser)]
#[command(name = "wallet-score")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "scorer.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scoring pipeline (default)
    Run {
        /// Transaction JSON file (overrides input.path)
        #[arg(short, long)]
        input: Option<String>,

        /// Score CSV destination (overrides output.scores_path)
        #[arg(short, long)]
        output: Option<String>,

        /// Also write per-wallet features to this CSV
        #[arg(long)]
        features: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wallet_credit_score=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Run {
        input: None,
        output: None,
        features: None,
    });

    let result = match command {
        Commands::Run {
            input,
            output,
            features,
        } => {
            if let Some(path) = input {
                config.input.path = path;
            }
            if let Some(path) = output {
                config.output.scores_path = path;
            }
            if features.is_some() {
                config.output.features_path = features;
            }
            config.validate().and_then(|_| commands::run(&config))
        }
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// 2 when the input data itself is unusable, 1 for everything else
fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<wallet_credit_score::Error>() {
        Some(err) if err.is_input_error() => 2,
        _ => 1,
    }
}
