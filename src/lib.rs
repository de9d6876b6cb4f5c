//! Unit-linked simulator - scenario projection and guarantee pricing for
//! recurring-contribution insurance products
//!
//! This library provides:
//! - Return estimation from historical fund prices
//! - Deterministic Optimistic/Expected/Pessimistic capital projections
//! - Payout derivation (tax, setup cost, death benefit, contribution guarantee)
//! - Black-Scholes pricing of the contribution guarantee with sensitivity sweeps

pub mod error;
pub mod funds;
pub mod contract;
pub mod simulation;
pub mod payout;
pub mod guarantee;
pub mod config;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, SimError};
pub use funds::{FundCatalogue, FundSeries, ReturnStatistics};
pub use contract::{AllocationPlan, ContributionSchedule, GuaranteeRate};
pub use simulation::{Scenario, ScenarioSimulator, SimulationConfig, SimulationResult};
pub use payout::{PayoutCalculator, PayoutSummary, TaxPolicy};
pub use guarantee::{GuaranteeCurve, GuaranteeValuer, SensitivityAnalyzer};
pub use config::RunConfig;
pub use runner::{RunReport, SimulationRunner};
