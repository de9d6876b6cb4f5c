//! Payout derivation from simulated capital

mod calculator;
mod tax;

pub use calculator::{PayoutCalculator, PayoutSummary, PayoutTerms};
pub use tax::{AssetMix, TaxPolicy, TaxRateResolver};
