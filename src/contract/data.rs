//! Contract terms: fund allocation, contribution schedule and guarantee level

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SimError};
use crate::funds::{FundCatalogue, MAX_SELECTED_FUNDS};

/// Allowed floating-point slack when checking the 100% total
const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// Longest supported contract horizon in years
pub const MAX_HORIZON_YEARS: u32 = 40;

/// Percentage of each contribution invested in each fund
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    shares: BTreeMap<String, f64>,
}

impl AllocationPlan {
    /// Build a plan, failing unless every share is non-negative and the total is 100
    pub fn new(shares: BTreeMap<String, f64>) -> Result<Self> {
        if let Some((fund, &percent)) = shares.iter().find(|(_, &p)| !p.is_finite()) {
            return Err(SimError::InvalidAllocation {
                fund: fund.clone(),
                percent,
            });
        }
        if let Some((fund, &percent)) = shares.iter().find(|(_, &p)| p < 0.0) {
            return Err(SimError::NegativeAllocation {
                fund: fund.clone(),
                percent,
            });
        }

        let sum: f64 = shares.values().sum();
        if (sum - 100.0).abs() > ALLOCATION_TOLERANCE {
            return Err(SimError::AllocationSum { sum });
        }

        Ok(Self { shares })
    }

    /// Convenience constructor from (fund, percent) pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        Self::new(pairs.into_iter().map(|(f, p)| (f.to_string(), p)).collect())
    }

    /// Check every fund exists in the catalogue and the selection size limit
    pub fn validate_against(&self, catalogue: &FundCatalogue) -> Result<()> {
        if self.shares.len() > MAX_SELECTED_FUNDS {
            return Err(SimError::TooManyFunds {
                max: MAX_SELECTED_FUNDS,
                selected: self.shares.len(),
            });
        }
        for fund in self.shares.keys() {
            catalogue.require(fund)?;
        }
        Ok(())
    }

    /// Allocation of a fund in percent (0 if not selected)
    pub fn percent(&self, fund: &str) -> f64 {
        self.shares.get(fund).copied().unwrap_or(0.0)
    }

    /// Funds that actually receive part of the contribution
    pub fn invested_funds(&self) -> impl Iterator<Item = (&str, f64)> {
        self.shares
            .iter()
            .filter(|(_, &p)| p > 0.0)
            .map(|(f, &p)| (f.as_str(), p))
    }
}

/// Monthly contribution amount and contract horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionSchedule {
    monthly_amount: f64,
    horizon_years: u32,
}

impl ContributionSchedule {
    pub fn new(monthly_amount: f64, horizon_years: u32) -> Result<Self> {
        if !(monthly_amount > 0.0) || !monthly_amount.is_finite() {
            return Err(SimError::invalid(
                "monthly_contribution",
                format!("must be positive, got {}", monthly_amount),
            ));
        }
        if horizon_years == 0 || horizon_years > MAX_HORIZON_YEARS {
            return Err(SimError::invalid(
                "horizon_years",
                format!("must be between 1 and {}, got {}", MAX_HORIZON_YEARS, horizon_years),
            ));
        }
        Ok(Self {
            monthly_amount,
            horizon_years,
        })
    }

    pub fn monthly_amount(&self) -> f64 {
        self.monthly_amount
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    pub fn months(&self) -> u32 {
        self.horizon_years * 12
    }

    /// Total of all contributions over the horizon
    pub fn total_contributions(&self) -> f64 {
        self.monthly_amount * self.months() as f64
    }
}

/// Contractual share of paid-in capital protected at maturity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuaranteeRate {
    #[default]
    #[serde(rename = "0%", alias = "None")]
    None,
    #[serde(rename = "25%")]
    Quarter,
    #[serde(rename = "50%")]
    Half,
    #[serde(rename = "75%")]
    ThreeQuarters,
}

impl GuaranteeRate {
    pub fn rate(self) -> f64 {
        match self {
            GuaranteeRate::None => 0.0,
            GuaranteeRate::Quarter => 0.25,
            GuaranteeRate::Half => 0.50,
            GuaranteeRate::ThreeQuarters => 0.75,
        }
    }
}

impl std::fmt::Display for GuaranteeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", (self.rate() * 100.0) as u32)
    }
}
