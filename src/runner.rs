//! End-to-end run of the contribution simulator and guarantee pricer
//!
//! The runner holds the fund catalogue for the lifetime of the process and
//! executes one batch per call: fetch prices, estimate returns, simulate all
//! scenarios, derive payouts and, side by side, price the guarantee.
//!
//! # Example
//! ```ignore
//! let runner = SimulationRunner::new(FundCatalogue::default_catalogue());
//! let source = Arc::new(CsvPriceSource::new("data/prices"));
//! let report = runner.run(&config, source)?;
//! for payout in &report.payouts {
//!     println!("{}: {:.2}", payout.scenario, payout.guaranteed_payout);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::RunConfig;
use crate::contract::AllocationPlan;
use crate::error::{Result, SimError};
use crate::funds::{
    estimate_all, fetch_all, FundCatalogue, FundExclusion, FundInfo, FundSeries, PriceSource,
    ReturnStatistics,
};
use crate::guarantee::{
    GuaranteeCurve, GuaranteeGrid, GuaranteeValuer, SensitivityAnalyzer, SensitivityCurve,
};
use crate::payout::{AssetMix, PayoutCalculator, PayoutSummary, TaxRateResolver};
use crate::simulation::{
    NoopObserver, ScenarioSimulator, SimulationInputs, SimulationObserver, SimulationResult,
};

/// Guarantee curve and its sensitivity families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuaranteeReport {
    pub valuer: GuaranteeValuer,
    pub curve: GuaranteeCurve,
    pub volatility_sensitivity: Vec<SensitivityCurve>,
    pub maturity_sensitivity: Vec<SensitivityCurve>,
}

impl GuaranteeReport {
    pub fn build(
        valuer: GuaranteeValuer,
        grid: &GuaranteeGrid,
        volatilities: &[f64],
        maturities: &[f64],
    ) -> Self {
        let analyzer = SensitivityAnalyzer::new(valuer, grid.clone());
        Self {
            valuer,
            curve: valuer.curve(grid),
            volatility_sensitivity: analyzer.sweep_volatility(volatilities),
            maturity_sensitivity: analyzer.sweep_maturity(maturities),
        }
    }
}

/// Everything produced by one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub statistics: BTreeMap<String, ReturnStatistics>,
    pub exclusions: Vec<FundExclusion>,
    pub asset_mix: AssetMix,
    pub tax_rate: f64,
    pub simulation: SimulationResult,
    pub payouts: Vec<PayoutSummary>,
    pub guarantee: GuaranteeReport,
}

/// Runs complete simulations against an injected fund catalogue
pub struct SimulationRunner {
    catalogue: FundCatalogue,
    observer: Box<dyn SimulationObserver>,
}

impl SimulationRunner {
    pub fn new(catalogue: FundCatalogue) -> Self {
        Self {
            catalogue,
            observer: Box::new(NoopObserver),
        }
    }

    /// Attach an observer that receives per-month simulation events
    pub fn with_observer(mut self, observer: Box<dyn SimulationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validate the configuration against the catalogue
    pub fn validate(&self, config: &RunConfig) -> Result<AllocationPlan> {
        config.validate()?;
        let plan = config.allocation_plan()?;
        plan.validate_against(&self.catalogue)?;
        Ok(plan)
    }

    /// Fetch prices for every invested fund, then run
    pub fn run(&self, config: &RunConfig, source: Arc<dyn PriceSource>) -> Result<RunReport> {
        let plan = self.validate(config)?;

        let funds: Vec<FundInfo> = plan
            .invested_funds()
            .map(|(id, _)| self.catalogue.require(id).cloned())
            .collect::<Result<_>>()?;

        log::info!("Fetching price history for {} funds", funds.len());
        let (series, exclusions) = fetch_all(source, &funds, config.fetch_timeout());

        self.run_with_series(config, &series, exclusions)
    }

    /// Run on already fetched series; `exclusions` lists funds whose fetch failed
    pub fn run_with_series(
        &self,
        config: &RunConfig,
        series: &[FundSeries],
        mut exclusions: Vec<FundExclusion>,
    ) -> Result<RunReport> {
        let plan = self.validate(config)?;
        let schedule = config.schedule()?;

        let (statistics, estimate_exclusions) = estimate_all(series);
        exclusions.extend(estimate_exclusions);

        if statistics.is_empty() {
            log::error!("No usable price data for any of the selected funds");
            return Err(SimError::NoUsableData);
        }

        let asset_mix = AssetMix::from_plan(&plan, &self.catalogue)?;
        let tax_rate = config.tax_policy.tax_rate(&asset_mix);
        let simulator = ScenarioSimulator::new(config.simulation_config());
        let valuer = config.valuer()?;
        let grid = config.grid();

        let inputs = SimulationInputs {
            plan: &plan,
            statistics: &statistics,
            schedule: &schedule,
        };

        let (simulation, guarantee) = rayon::join(
            || simulator.simulate_with_observer(&inputs, self.observer.as_ref()),
            || GuaranteeReport::build(valuer, &grid, &config.volatility_sweep, &config.maturity_sweep),
        );
        let simulation = simulation?;

        let payouts = PayoutCalculator::new(config.payout_terms(), tax_rate).summarize(&simulation);

        log::info!(
            "Run complete: {} funds invested, {} excluded, tax rate {:.2}%",
            simulation.invested_funds.len(),
            exclusions.len(),
            tax_rate * 100.0
        );

        Ok(RunReport {
            statistics,
            exclusions,
            asset_mix,
            tax_rate,
            simulation,
            payouts,
            guarantee,
        })
    }
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self::new(FundCatalogue::default_catalogue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostModel;
    use crate::contract::GuaranteeRate;
    use crate::funds::InMemoryPriceSource;
    use crate::payout::TaxPolicy;
    use crate::simulation::Scenario;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
    }

    fn config(allocations: &[(&str, f64)]) -> RunConfig {
        RunConfig {
            monthly_contribution: 100.0,
            horizon_years: 1,
            allocations: allocations.iter().map(|&(f, p)| (f.to_string(), p)).collect(),
            cost_model: CostModel::None,
            setup_cost_rate: 0.0,
            ..Default::default()
        }
    }

    /// Prices growing exactly 1% per month
    fn growing(id: &str) -> FundSeries {
        let prices: Vec<f64> = (0..61).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        FundSeries::monthly(id, start(), &prices).unwrap()
    }

    #[test]
    fn test_end_to_end_closed_form() {
        let runner = SimulationRunner::default();
        let source = InMemoryPriceSource::new().with_series(growing("URTH"));

        let report = runner.run(&config(&[("URTH", 100.0)]), Arc::new(source)).unwrap();

        let stats = report.statistics["URTH"];
        assert_relative_eq!(stats.mean_return, 0.01, epsilon = 1e-12);
        assert!(stats.volatility < 1e-12);

        let closed_form: f64 = (0..12).map(|t| 100.0 * 1.01_f64.powi(t)).sum();
        let expected = report.simulation.trajectory(Scenario::Expected).unwrap();
        assert_relative_eq!(expected.final_capital(), closed_form, max_relative = 1e-9);

        assert_eq!(report.payouts.len(), 3);
        let payout = &report.payouts[1];
        assert_eq!(payout.scenario, Scenario::Expected);
        assert_relative_eq!(payout.paid_in, 1200.0);
        assert_relative_eq!(payout.tax, (closed_form - 1200.0) * 0.26, max_relative = 1e-9);

        assert_eq!(report.guarantee.curve.points.len(), 21);
        assert_eq!(report.guarantee.volatility_sensitivity.len(), 4);
        assert_eq!(report.guarantee.maturity_sensitivity.len(), 4);
        assert_eq!(report.guarantee.valuer.initial_investment, 1200.0);
    }

    #[test]
    fn test_flat_fund_accumulates_contributions() {
        let runner = SimulationRunner::default();
        let flat = FundSeries::monthly("SPY", start(), &[50.0; 24]).unwrap();

        let report = runner
            .run_with_series(&config(&[("SPY", 100.0)]), &[flat], Vec::new())
            .unwrap();

        for payout in &report.payouts {
            assert_eq!(payout.final_capital, 1200.0);
            assert_eq!(payout.paid_in, 1200.0);
            assert_eq!(payout.tax, 0.0);
        }
    }

    #[test]
    fn test_missing_fund_is_excluded_not_fatal() {
        let runner = SimulationRunner::default();
        let source = InMemoryPriceSource::new().with_series(growing("URTH"));

        let report = runner
            .run(&config(&[("URTH", 50.0), ("SPY", 50.0)]), Arc::new(source))
            .unwrap();

        assert_eq!(report.exclusions.len(), 1);
        assert_eq!(report.exclusions[0].fund, "SPY");
        assert_eq!(report.simulation.uninvested_percent, 50.0);
        assert_relative_eq!(report.payouts[0].paid_in, 600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_statistics_recorded_as_exclusion() {
        let runner = SimulationRunner::default();
        let extreme = FundSeries::monthly("URTH", start(), &[1e-200, 1.0, 1.0]).unwrap();

        let report = runner
            .run_with_series(
                &config(&[("URTH", 50.0), ("SPY", 50.0)]),
                &[extreme, growing("SPY")],
                Vec::new(),
            )
            .unwrap();

        assert!(!report.statistics.contains_key("URTH"));
        assert_eq!(report.exclusions.len(), 1);
        assert_eq!(report.exclusions[0].fund, "URTH");
        assert_eq!(report.simulation.uninvested_percent, 50.0);
    }

    #[test]
    fn test_all_funds_missing_is_fatal() {
        let runner = SimulationRunner::default();
        let result = runner.run(&config(&[("URTH", 100.0)]), Arc::new(InMemoryPriceSource::new()));
        assert!(matches!(result, Err(SimError::NoUsableData)));
    }

    #[test]
    fn test_invalid_allocation_fails_fast() {
        let runner = SimulationRunner::default();
        let source = InMemoryPriceSource::new().with_series(growing("URTH"));
        let result = runner.run(&config(&[("URTH", 90.0)]), Arc::new(source));
        assert!(matches!(result, Err(SimError::AllocationSum { .. })));
    }

    #[test]
    fn test_unknown_fund_rejected() {
        let runner = SimulationRunner::default();
        let result = runner.run_with_series(&config(&[("ZZZ", 100.0)]), &[], Vec::new());
        assert!(matches!(result, Err(SimError::UnknownFund(_))));
    }

    #[test]
    fn test_preferential_tax_for_bond_only_plan() {
        let runner = SimulationRunner::default();
        let mut cfg = config(&[("IEGA.DE", 100.0)]);
        cfg.tax_policy = TaxPolicy::FixedIncomePreferential {
            standard_rate: 0.26,
            fixed_income_rate: 0.125,
        };
        cfg.guarantee_rate = GuaranteeRate::ThreeQuarters;

        let report = runner
            .run_with_series(&cfg, &[growing("IEGA.DE")], Vec::new())
            .unwrap();

        assert_eq!(report.tax_rate, 0.125);
        assert!(report.asset_mix.is_all_fixed_income());
        for payout in &report.payouts {
            assert!(payout.guaranteed_payout >= payout.paid_in * 0.75);
        }
    }
}
