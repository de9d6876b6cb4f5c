//! Price the contribution guarantee without running a simulation
//!
//! Outputs the guarantee curve and both sensitivity families as JSON.

use clap::Parser;
use unit_linked_sim::guarantee::{
    GuaranteeGrid, DEFAULT_MATURITY_SWEEP, DEFAULT_PRICING_VOLATILITY, DEFAULT_RISK_FREE_RATE,
    DEFAULT_VOLATILITY_SWEEP,
};
use unit_linked_sim::runner::GuaranteeReport;
use unit_linked_sim::{ContributionSchedule, GuaranteeValuer};

#[derive(Parser, Debug)]
#[command(name = "guarantee-sweep", about = "Guarantee cost curves for a contribution plan")]
struct Args {
    /// Monthly contribution
    #[arg(long, default_value_t = 100.0)]
    contribution: f64,

    /// Horizon in years
    #[arg(long, default_value_t = 20)]
    years: u32,

    /// Risk-free rate
    #[arg(long, default_value_t = DEFAULT_RISK_FREE_RATE)]
    rate: f64,

    /// Assumed volatility
    #[arg(long, default_value_t = DEFAULT_PRICING_VOLATILITY)]
    volatility: f64,

    /// Number of grid intervals between 0% and 100%
    #[arg(long, default_value_t = 20)]
    steps: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let schedule = ContributionSchedule::new(args.contribution, args.years)?;
    let valuer = GuaranteeValuer::for_schedule(&schedule, args.rate, args.volatility);
    let report = GuaranteeReport::build(
        valuer,
        &GuaranteeGrid::evenly_spaced(args.steps),
        &DEFAULT_VOLATILITY_SWEEP,
        &DEFAULT_MATURITY_SWEEP,
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
