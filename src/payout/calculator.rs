//! Payout after tax, setup costs and guarantees

use serde::{Deserialize, Serialize};

use crate::contract::GuaranteeRate;
use crate::simulation::{Scenario, SimulationResult};

/// Contract terms that shape the payout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutTerms {
    /// One-time cost as a share of paid-in capital
    pub setup_cost_rate: f64,
    pub guarantee_rate: GuaranteeRate,
    /// Death-benefit rider paying at least the paid-in capital
    pub death_benefit: bool,
}

impl Default for PayoutTerms {
    fn default() -> Self {
        Self {
            setup_cost_rate: 0.02,
            guarantee_rate: GuaranteeRate::None,
            death_benefit: true,
        }
    }
}

/// Payout breakdown for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutSummary {
    #[serde(rename = "Scenario")]
    pub scenario: Scenario,
    #[serde(rename = "FinalCapital")]
    pub final_capital: f64,
    #[serde(rename = "PaidIn")]
    pub paid_in: f64,
    #[serde(rename = "GrossEarnings")]
    pub gross_earnings: f64,
    #[serde(rename = "Tax")]
    pub tax: f64,
    #[serde(rename = "SetupCost")]
    pub setup_cost: f64,
    #[serde(rename = "AfterTax")]
    pub after_tax: f64,
    #[serde(rename = "DeathBenefit")]
    pub death_benefit: f64,
    #[serde(rename = "GuaranteeFloor")]
    pub guarantee_floor: f64,
    #[serde(rename = "GuaranteedPayout")]
    pub guaranteed_payout: f64,
}

/// Applies tax, setup cost and guarantee floors to simulated capital
#[derive(Debug, Clone, Copy)]
pub struct PayoutCalculator {
    terms: PayoutTerms,
    tax_rate: f64,
}

impl PayoutCalculator {
    /// `tax_rate` is the rate already resolved for the contract's asset mix
    pub fn new(terms: PayoutTerms, tax_rate: f64) -> Self {
        Self { terms, tax_rate }
    }

    pub fn calculate(&self, scenario: Scenario, final_capital: f64, paid_in: f64) -> PayoutSummary {
        let gross_earnings = (final_capital - paid_in).max(0.0);
        let tax = gross_earnings * self.tax_rate;
        let setup_cost = paid_in * self.terms.setup_cost_rate;
        let after_tax = final_capital - tax - setup_cost;

        let death_benefit = if self.terms.death_benefit {
            paid_in.max(after_tax)
        } else {
            after_tax
        };

        let guarantee_floor = paid_in * self.terms.guarantee_rate.rate();
        let guaranteed_payout = death_benefit.max(guarantee_floor);

        PayoutSummary {
            scenario,
            final_capital,
            paid_in,
            gross_earnings,
            tax,
            setup_cost,
            after_tax,
            death_benefit,
            guarantee_floor,
            guaranteed_payout,
        }
    }

    /// One summary per simulated scenario
    pub fn summarize(&self, result: &SimulationResult) -> Vec<PayoutSummary> {
        result
            .trajectories
            .iter()
            .map(|t| self.calculate(t.scenario, t.final_capital(), t.total_paid_in()))
            .collect()
    }
}
