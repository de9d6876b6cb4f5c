//! Simulation output structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::scenario::Scenario;

/// Monthly capital path of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalTrajectory {
    pub scenario: Scenario,

    /// Total capital across funds at the end of each month
    pub total: Vec<f64>,

    /// Cumulative invested contributions at the end of each month
    pub paid_in: Vec<f64>,

    /// Capital of each invested fund at the end of each month
    pub funds: BTreeMap<String, Vec<f64>>,
}

impl CapitalTrajectory {
    pub fn new(scenario: Scenario, months: usize) -> Self {
        Self {
            scenario,
            total: Vec::with_capacity(months),
            paid_in: Vec::with_capacity(months),
            funds: BTreeMap::new(),
        }
    }

    pub fn months(&self) -> usize {
        self.total.len()
    }

    pub fn final_capital(&self) -> f64 {
        self.total.last().copied().unwrap_or(0.0)
    }

    pub fn total_paid_in(&self) -> f64 {
        self.paid_in.last().copied().unwrap_or(0.0)
    }
}

/// One month of the scenario comparison table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryRow {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Optimistic")]
    pub optimistic: f64,
    #[serde(rename = "Expected")]
    pub expected: f64,
    #[serde(rename = "Pessimistic")]
    pub pessimistic: f64,
    #[serde(rename = "PaidIn")]
    pub paid_in: f64,
}

/// Trajectories for all scenarios of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One trajectory per scenario, in [`Scenario::ALL`] order
    pub trajectories: Vec<CapitalTrajectory>,

    /// Funds that received contributions
    pub invested_funds: Vec<String>,

    /// Allocation percent of funds left uninvested for lack of data
    pub uninvested_percent: f64,
}

impl SimulationResult {
    pub fn trajectory(&self, scenario: Scenario) -> Option<&CapitalTrajectory> {
        self.trajectories.iter().find(|t| t.scenario == scenario)
    }

    /// Month-indexed table with one column per scenario
    pub fn rows(&self) -> Vec<TrajectoryRow> {
        let column = |scenario: Scenario, idx: usize| {
            self.trajectory(scenario)
                .and_then(|t| t.total.get(idx).copied())
                .unwrap_or(0.0)
        };
        let months = self.trajectories.first().map(|t| t.months()).unwrap_or(0);
        let paid_in = self.trajectories.first().map(|t| t.paid_in.as_slice()).unwrap_or(&[]);

        (0..months)
            .map(|idx| TrajectoryRow {
                month: idx as u32 + 1,
                optimistic: column(Scenario::Optimistic, idx),
                expected: column(Scenario::Expected, idx),
                pessimistic: column(Scenario::Pessimistic, idx),
                paid_in: paid_in.get(idx).copied().unwrap_or(0.0),
            })
            .collect()
    }
}
