//! Tax-rate resolution by asset mix

use serde::{Deserialize, Serialize};

use crate::contract::AllocationPlan;
use crate::error::Result;
use crate::funds::FundCatalogue;

/// Allocation split by asset class, in percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetMix {
    pub fixed_income_percent: f64,
    pub equity_percent: f64,
}

impl AssetMix {
    /// Classify every fund with a positive allocation
    pub fn from_plan(plan: &AllocationPlan, catalogue: &FundCatalogue) -> Result<Self> {
        let mut mix = AssetMix::default();
        for (fund, percent) in plan.invested_funds() {
            if catalogue.require(fund)?.asset_class.is_fixed_income() {
                mix.fixed_income_percent += percent;
            } else {
                mix.equity_percent += percent;
            }
        }
        Ok(mix)
    }

    pub fn is_all_fixed_income(&self) -> bool {
        self.fixed_income_percent > 0.0 && self.equity_percent == 0.0
    }
}

/// Resolves the tax rate on earnings for an asset mix
pub trait TaxRateResolver {
    fn tax_rate(&self, mix: &AssetMix) -> f64;
}

/// Configurable tax policies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxPolicy {
    /// Same rate whatever the allocation
    Flat { rate: f64 },
    /// Reduced rate when the whole allocation is fixed income
    FixedIncomePreferential {
        standard_rate: f64,
        fixed_income_rate: f64,
    },
}

impl Default for TaxPolicy {
    fn default() -> Self {
        TaxPolicy::Flat { rate: 0.26 }
    }
}

impl TaxRateResolver for TaxPolicy {
    fn tax_rate(&self, mix: &AssetMix) -> f64 {
        match *self {
            TaxPolicy::Flat { rate } => rate,
            TaxPolicy::FixedIncomePreferential {
                standard_rate,
                fixed_income_rate,
            } => {
                if mix.is_all_fixed_income() {
                    fixed_income_rate
                } else {
                    standard_rate
                }
            }
        }
    }
}

impl TaxPolicy {
    /// Every rate this policy can resolve to
    pub fn rates(&self) -> Vec<f64> {
        match *self {
            TaxPolicy::Flat { rate } => vec![rate],
            TaxPolicy::FixedIncomePreferential {
                standard_rate,
                fixed_income_rate,
            } => vec![standard_rate, fixed_income_rate],
        }
    }
}
