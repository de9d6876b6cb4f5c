//! Run configuration
//!
//! A run is described by a JSON document. Every field except `allocations`
//! has a product default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::contract::{AllocationPlan, ContributionSchedule, GuaranteeRate};
use crate::error::{Result, SimError};
use crate::guarantee::{
    GuaranteeGrid, GuaranteeValuer, DEFAULT_MATURITY_SWEEP, DEFAULT_PRICING_VOLATILITY,
    DEFAULT_RISK_FREE_RATE, DEFAULT_VOLATILITY_SWEEP,
};
use crate::payout::{PayoutTerms, TaxPolicy};
use crate::simulation::{CostDrag, ReturnAggregation, SimulationConfig, DEFAULT_REBALANCING_DRAG};

/// Highest annual insurance cost the product allows
pub const MAX_INSURANCE_COST_RATE: f64 = 0.03;

/// Highest one-time setup cost the product allows
pub const MAX_SETUP_COST_RATE: f64 = 0.05;

/// Which costs the simulator applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    None,
    Rebalancing,
    #[default]
    Insurance,
    RebalancingAndInsurance,
}

/// Complete input for one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Monthly contribution in currency units (default: 100)
    #[serde(default = "default_contribution")]
    pub monthly_contribution: f64,

    /// Contract horizon in years, 1-40 (default: 20)
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,

    /// Fund id -> percent of each contribution; must total 100
    #[serde(default)]
    pub allocations: BTreeMap<String, f64>,

    /// Annual insurance cost as share of fund value, 0-3% (default: 1%)
    #[serde(default = "default_insurance_cost_rate")]
    pub insurance_cost_rate: f64,

    /// One-time setup cost as share of paid-in capital, 0-5% (default: 2%)
    #[serde(default = "default_setup_cost_rate")]
    pub setup_cost_rate: f64,

    /// Monthly return drag from rebalancing (default: 0.003%)
    #[serde(default = "default_rebalancing_drag")]
    pub rebalancing_drag: f64,

    #[serde(default)]
    pub cost_model: CostModel,

    #[serde(default)]
    pub return_aggregation: ReturnAggregation,

    #[serde(default)]
    pub tax_policy: TaxPolicy,

    #[serde(default)]
    pub guarantee_rate: GuaranteeRate,

    /// Death-benefit rider (default: enabled)
    #[serde(default = "default_true")]
    pub death_benefit: bool,

    /// Risk-free rate for guarantee pricing (default: 2%)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Volatility assumed for guarantee pricing (default: 15%)
    #[serde(default = "default_pricing_volatility")]
    pub pricing_volatility: f64,

    /// Number of 0-100% grid intervals (default: 20, i.e. 5% steps)
    #[serde(default = "default_grid_steps")]
    pub guarantee_grid_steps: u32,

    /// Explicit guarantee levels (fractions 0-1); replaces the even grid when set
    #[serde(default)]
    pub guarantee_levels: Option<Vec<f64>>,

    #[serde(default = "default_volatility_sweep")]
    pub volatility_sweep: Vec<f64>,

    #[serde(default = "default_maturity_sweep")]
    pub maturity_sweep: Vec<f64>,

    /// Per-fund price fetch timeout in seconds (default: 10)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_contribution() -> f64 { 100.0 }
fn default_horizon_years() -> u32 { 20 }
fn default_insurance_cost_rate() -> f64 { 0.01 }
fn default_setup_cost_rate() -> f64 { 0.02 }
fn default_rebalancing_drag() -> f64 { DEFAULT_REBALANCING_DRAG }
fn default_true() -> bool { true }
fn default_risk_free_rate() -> f64 { DEFAULT_RISK_FREE_RATE }
fn default_pricing_volatility() -> f64 { DEFAULT_PRICING_VOLATILITY }
fn default_grid_steps() -> u32 { 20 }
fn default_volatility_sweep() -> Vec<f64> { DEFAULT_VOLATILITY_SWEEP.to_vec() }
fn default_maturity_sweep() -> Vec<f64> { DEFAULT_MATURITY_SWEEP.to_vec() }
fn default_fetch_timeout_secs() -> u64 { 10 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            monthly_contribution: default_contribution(),
            horizon_years: default_horizon_years(),
            allocations: BTreeMap::new(),
            insurance_cost_rate: default_insurance_cost_rate(),
            setup_cost_rate: default_setup_cost_rate(),
            rebalancing_drag: default_rebalancing_drag(),
            cost_model: CostModel::default(),
            return_aggregation: ReturnAggregation::default(),
            tax_policy: TaxPolicy::default(),
            guarantee_rate: GuaranteeRate::default(),
            death_benefit: default_true(),
            risk_free_rate: default_risk_free_rate(),
            pricing_volatility: default_pricing_volatility(),
            guarantee_grid_steps: default_grid_steps(),
            guarantee_levels: None,
            volatility_sweep: default_volatility_sweep(),
            maturity_sweep: default_maturity_sweep(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("{} is outside [{}, {}]", value, min, max),
        ))
    }
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Check parameter ranges; allocation and schedule are checked when built
    pub fn validate(&self) -> Result<()> {
        self.schedule()?;
        self.allocation_plan()?;

        check_range("insurance_cost_rate", self.insurance_cost_rate, 0.0, MAX_INSURANCE_COST_RATE)?;
        check_range("setup_cost_rate", self.setup_cost_rate, 0.0, MAX_SETUP_COST_RATE)?;
        check_range("rebalancing_drag", self.rebalancing_drag, 0.0, 1.0)?;
        check_range("risk_free_rate", self.risk_free_rate, -1.0, 1.0)?;
        check_range("pricing_volatility", self.pricing_volatility, 0.0, 5.0)?;

        for rate in self.tax_policy.rates() {
            check_range("tax_policy", rate, 0.0, 1.0)?;
        }
        for &vol in &self.volatility_sweep {
            check_range("volatility_sweep", vol, 0.0, 5.0)?;
        }
        for &years in &self.maturity_sweep {
            check_range("maturity_sweep", years, 0.0, 100.0)?;
        }
        if self.guarantee_grid_steps == 0 {
            return Err(SimError::invalid("guarantee_grid_steps", "must be at least 1"));
        }
        if let Some(levels) = &self.guarantee_levels {
            if levels.is_empty() {
                return Err(SimError::invalid("guarantee_levels", "must not be empty"));
            }
            for &level in levels {
                check_range("guarantee_levels", level, 0.0, 1.0)?;
            }
        }

        Ok(())
    }

    pub fn allocation_plan(&self) -> Result<AllocationPlan> {
        AllocationPlan::new(self.allocations.clone())
    }

    pub fn schedule(&self) -> Result<ContributionSchedule> {
        ContributionSchedule::new(self.monthly_contribution, self.horizon_years)
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        let cost_drag = match self.cost_model {
            CostModel::None => CostDrag::None,
            CostModel::Rebalancing => CostDrag::Rebalancing {
                monthly_drag: self.rebalancing_drag,
            },
            CostModel::Insurance => CostDrag::Insurance {
                annual_rate: self.insurance_cost_rate,
            },
            CostModel::RebalancingAndInsurance => CostDrag::RebalancingAndInsurance {
                monthly_drag: self.rebalancing_drag,
                annual_rate: self.insurance_cost_rate,
            },
        };

        SimulationConfig {
            return_aggregation: self.return_aggregation,
            cost_drag,
        }
    }

    pub fn payout_terms(&self) -> PayoutTerms {
        PayoutTerms {
            setup_cost_rate: self.setup_cost_rate,
            guarantee_rate: self.guarantee_rate,
            death_benefit: self.death_benefit,
        }
    }

    pub fn valuer(&self) -> Result<GuaranteeValuer> {
        Ok(GuaranteeValuer::for_schedule(
            &self.schedule()?,
            self.risk_free_rate,
            self.pricing_volatility,
        ))
    }

    pub fn grid(&self) -> GuaranteeGrid {
        match &self.guarantee_levels {
            Some(levels) => GuaranteeGrid::from_levels(levels.clone()),
            None => GuaranteeGrid::evenly_spaced(self.guarantee_grid_steps),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
