//! CLI command implementations

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::pipeline::{self, PipelineReport};

/// Run the scoring pipeline and print the progress report
pub fn run(config: &Config) -> Result<()> {
    info!("Starting wallet scoring run...");
    info!(
        "Input: {}, output: {}",
        config.input.path, config.output.scores_path
    );

    let report = pipeline::run(config)
        .with_context(|| format!("Scoring run over {} failed", config.input.path))?;

    print_report(&report);
    Ok(())
}

/// Show the effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.summary());
    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!("Loaded {} transactions.", report.transactions_loaded);
    println!(
        "Remaining after zero-check: {} transactions.",
        report.transactions_retained
    );
    println!("Wallets aggregated: {}", report.wallets);
    println!(
        "Risk labels: {} low risk, {} high risk",
        report.labels.low_risk, report.labels.high_risk
    );
    println!(
        "Train/test split: {} / {} wallets",
        report.train_size, report.test_size
    );
    println!("R^2 score: {:.4}", report.metrics.r2);
    println!("RMSE: {:.2}", report.metrics.rmse);
    println!("MAE: {:.2}", report.metrics.mae);
    println!("Saved {}", report.scores_path.display());
    if let Some(path) = &report.features_path {
        println!("Saved {}", path.display());
    }
}
