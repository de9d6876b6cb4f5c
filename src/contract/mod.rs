//! Contract terms validated before a run

mod data;

pub use data::{AllocationPlan, ContributionSchedule, GuaranteeRate, MAX_HORIZON_YEARS};
