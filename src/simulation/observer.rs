//! Observation hooks for simulation progress
//!
//! Observers only ever receive shared references or copies of computed
//! values, so attaching one cannot change a trajectory.

use super::scenario::Scenario;
use super::trajectory::CapitalTrajectory;

/// Values of one fund after a simulated month
#[derive(Debug, Clone, Copy)]
pub struct MonthSnapshot<'a> {
    pub scenario: Scenario,
    pub month: u32,
    pub fund_id: &'a str,
    pub adjusted_return: f64,
    pub contribution: f64,
    pub capital: f64,
}

/// Receives progress events from the simulator
pub trait SimulationObserver: Sync {
    fn on_month(&self, _snapshot: &MonthSnapshot<'_>) {}

    fn on_scenario_complete(&self, _trajectory: &CapitalTrajectory) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SimulationObserver for NoopObserver {}

/// Observer that writes events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SimulationObserver for LogObserver {
    fn on_month(&self, s: &MonthSnapshot<'_>) {
        log::trace!(
            "{} month {:>3} {}: return {:.6}, contribution {:.2}, capital {:.2}",
            s.scenario,
            s.month,
            s.fund_id,
            s.adjusted_return,
            s.contribution,
            s.capital
        );
    }

    fn on_scenario_complete(&self, trajectory: &CapitalTrajectory) {
        log::debug!(
            "{} complete: {} months, final capital {:.2}, paid in {:.2}",
            trajectory.scenario,
            trajectory.months(),
            trajectory.final_capital(),
            trajectory.total_paid_in()
        );
    }
}
