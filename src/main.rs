//! Unit-linked simulator CLI
//!
//! Runs one simulation from a JSON configuration and writes the scenario
//! table, payout summary and guarantee curves as CSV.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use unit_linked_sim::funds::CsvPriceSource;
use unit_linked_sim::guarantee::{SensitivityCurve, SweepParameter};
use unit_linked_sim::simulation::LogObserver;
use unit_linked_sim::{FundCatalogue, RunConfig, RunReport, SimulationRunner};

/// Project a unit-linked contract under three scenarios and price its guarantee
#[derive(Parser, Debug)]
#[command(name = "unit-linked-sim", version, about)]
struct Cli {
    /// JSON run configuration
    #[arg(short, long, default_value = "run_config.json")]
    config: PathBuf,

    /// Directory containing <TICKER>.csv price histories
    #[arg(short, long, default_value = "data/prices")]
    prices: PathBuf,

    /// Fund catalogue CSV (Ticker,Name,AssetClass,Description); built-in table if omitted
    #[arg(long)]
    catalogue: Option<PathBuf>,

    /// Directory for CSV outputs
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Override the per-fund fetch timeout from the configuration
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the full report as JSON instead of writing CSV files
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SensitivityRow<'a> {
    #[serde(rename = "Parameter")]
    parameter: &'a str,
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "GuaranteeLevel")]
    level: f64,
    #[serde(rename = "OptionPricePct")]
    price_percent: f64,
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn sensitivity_rows(curves: &[SensitivityCurve]) -> Vec<SensitivityRow<'_>> {
    curves
        .iter()
        .flat_map(|c| {
            let parameter = match c.parameter {
                SweepParameter::Volatility => "volatility",
                SweepParameter::Maturity => "maturity",
            };
            c.curve.points.iter().map(move |p| SensitivityRow {
                parameter,
                value: c.value,
                level: p.level,
                price_percent: p.price_percent,
            })
        })
        .collect()
}

fn write_outputs(report: &RunReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Unable to create output directory {}", dir.display()))?;

    write_csv(&dir.join("payout_summary.csv"), &report.payouts)?;
    write_csv(&dir.join("capital_trajectories.csv"), report.simulation.rows())?;
    write_csv(&dir.join("guarantee_curve.csv"), &report.guarantee.curve.points)?;

    let mut sensitivity = sensitivity_rows(&report.guarantee.volatility_sensitivity);
    sensitivity.extend(sensitivity_rows(&report.guarantee.maturity_sensitivity));
    write_csv(&dir.join("guarantee_sensitivity.csv"), sensitivity)?;

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("Return statistics (monthly):");
    for (fund, stats) in &report.statistics {
        println!(
            "  {:<10} mean {:>9.5}%  volatility {:>9.5}%  ({} returns)",
            fund,
            stats.mean_return * 100.0,
            stats.volatility * 100.0,
            stats.observations
        );
    }
    for exclusion in &report.exclusions {
        println!("  {:<10} excluded: {}", exclusion.fund, exclusion.reason);
    }

    println!("\nPayout summary (tax rate {:.2}%):", report.tax_rate * 100.0);
    println!(
        "{:<12} {:>14} {:>14} {:>12} {:>12} {:>14} {:>14}",
        "Scenario", "Final", "Paid-in", "Tax", "Setup", "After tax", "Guaranteed"
    );
    println!("{}", "-".repeat(98));
    for p in &report.payouts {
        println!(
            "{:<12} {:>14.2} {:>14.2} {:>12.2} {:>12.2} {:>14.2} {:>14.2}",
            p.scenario.name(),
            p.final_capital,
            p.paid_in,
            p.tax,
            p.setup_cost,
            p.after_tax,
            p.guaranteed_payout
        );
    }

    println!("\nGuarantee cost (% of {:.2}):", report.guarantee.valuer.initial_investment);
    for point in report.guarantee.curve.points.iter().step_by(4) {
        println!("  {:>5.0}% -> {:>8.4}%", point.level * 100.0, point.price_percent);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = RunConfig::from_json_path(&cli.config)
        .with_context(|| format!("Failed to read configuration {}", cli.config.display()))?;
    if let Some(secs) = cli.timeout_secs {
        config.fetch_timeout_secs = secs;
    }

    let catalogue = match &cli.catalogue {
        Some(path) => FundCatalogue::from_csv_path(path)
            .with_context(|| format!("Failed to load fund catalogue {}", path.display()))?,
        None => FundCatalogue::default_catalogue(),
    };

    let runner = SimulationRunner::new(catalogue).with_observer(Box::new(LogObserver));
    let source = Arc::new(CsvPriceSource::new(cli.prices.clone()));
    let report = runner.run(&config, source).context("Simulation failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report);
    write_outputs(&report, &cli.output)?;
    println!("\nResults written to: {}", cli.output.display());

    Ok(())
}
