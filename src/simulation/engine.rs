//! Scenario simulator compounding monthly contributions across funds

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::observer::{MonthSnapshot, NoopObserver, SimulationObserver};
use super::scenario::Scenario;
use super::state::FundState;
use super::trajectory::{CapitalTrajectory, SimulationResult};
use crate::contract::{AllocationPlan, ContributionSchedule};
use crate::error::{Result, SimError};
use crate::funds::ReturnStatistics;

/// Default monthly return drag from rebalancing trades
pub const DEFAULT_REBALANCING_DRAG: f64 = 0.00003;

/// How scenario returns are derived from fund statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnAggregation {
    /// Each fund is shifted by its own mean and volatility
    #[default]
    PerFund,
    /// Every fund earns the allocation-weighted portfolio mean, shifted by the
    /// allocation-weighted portfolio volatility
    PortfolioWeighted,
}

/// Costs applied while projecting
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostDrag {
    #[default]
    None,
    /// Constant subtracted from every monthly return
    Rebalancing { monthly_drag: f64 },
    /// Annual insurance charge deducted monthly from the fund balance
    Insurance { annual_rate: f64 },
    RebalancingAndInsurance { monthly_drag: f64, annual_rate: f64 },
}

impl CostDrag {
    pub fn return_drag(&self) -> f64 {
        match *self {
            CostDrag::Rebalancing { monthly_drag }
            | CostDrag::RebalancingAndInsurance { monthly_drag, .. } => monthly_drag,
            _ => 0.0,
        }
    }

    pub fn monthly_insurance_rate(&self) -> f64 {
        match *self {
            CostDrag::Insurance { annual_rate }
            | CostDrag::RebalancingAndInsurance { annual_rate, .. } => annual_rate / 12.0,
            _ => 0.0,
        }
    }
}

/// Strategy flags for the simulator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub return_aggregation: ReturnAggregation,
    #[serde(default)]
    pub cost_drag: CostDrag,
}

/// Inputs shared by all scenarios of one run
#[derive(Debug, Clone, Copy)]
pub struct SimulationInputs<'a> {
    pub plan: &'a AllocationPlan,
    pub statistics: &'a BTreeMap<String, ReturnStatistics>,
    pub schedule: &'a ContributionSchedule,
}

/// Deterministic multi-scenario projection engine
#[derive(Debug, Clone, Default)]
pub struct ScenarioSimulator {
    config: SimulationConfig,
}

impl ScenarioSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run all scenarios
    pub fn simulate(&self, inputs: &SimulationInputs<'_>) -> Result<SimulationResult> {
        self.simulate_with_observer(inputs, &NoopObserver)
    }

    /// Run all scenarios, reporting progress to `observer`
    pub fn simulate_with_observer(
        &self,
        inputs: &SimulationInputs<'_>,
        observer: &dyn SimulationObserver,
    ) -> Result<SimulationResult> {
        let (invested, uninvested_percent) = Self::invested_funds(inputs);
        if invested.is_empty() {
            return Err(SimError::NoUsableData);
        }
        if uninvested_percent > 0.0 {
            log::warn!(
                "{:.2}% of the allocation has no usable statistics and stays uninvested",
                uninvested_percent
            );
        }

        let trajectories = Scenario::ALL
            .par_iter()
            .map(|&scenario| self.run_scenario(scenario, &invested, inputs, observer))
            .collect::<Result<Vec<_>>>()?;

        Ok(SimulationResult {
            trajectories,
            invested_funds: invested.iter().map(|(id, _, _)| id.to_string()).collect(),
            uninvested_percent,
        })
    }

    /// Funds with a positive allocation and usable statistics, plus the
    /// allocation percent that cannot be invested
    fn invested_funds<'a>(
        inputs: &SimulationInputs<'a>,
    ) -> (Vec<(&'a str, f64, ReturnStatistics)>, f64) {
        let mut invested = Vec::new();
        let mut uninvested = 0.0;

        for (fund, percent) in inputs.plan.invested_funds() {
            match inputs.statistics.get(fund) {
                Some(stats) if stats.mean_return.is_finite() && stats.volatility.is_finite() => {
                    invested.push((fund, percent, *stats));
                }
                _ => uninvested += percent,
            }
        }

        (invested, uninvested)
    }

    /// Adjusted monthly return for every invested fund under `scenario`
    fn scenario_returns(
        &self,
        scenario: Scenario,
        invested: &[(&str, f64, ReturnStatistics)],
    ) -> Result<Vec<f64>> {
        let drag = self.config.cost_drag.return_drag();

        let raw: Vec<f64> = match self.config.return_aggregation {
            ReturnAggregation::PerFund => invested
                .iter()
                .map(|(_, _, s)| scenario.adjusted_return(s.mean_return, s.volatility))
                .collect(),
            ReturnAggregation::PortfolioWeighted => {
                let total_weight: f64 = invested.iter().map(|(_, p, _)| p).sum();
                if total_weight <= 0.0 {
                    return Err(SimError::NoUsableData);
                }
                let mean: f64 = invested
                    .iter()
                    .map(|(_, p, s)| p / total_weight * s.mean_return)
                    .sum();
                let volatility: f64 = invested
                    .iter()
                    .map(|(_, p, s)| p / total_weight * s.volatility)
                    .sum();
                vec![scenario.adjusted_return(mean, volatility); invested.len()]
            }
        };

        raw.into_iter()
            .zip(invested)
            .map(|(r, (fund, _, _))| {
                let adjusted = r - drag;
                if adjusted <= -1.0 {
                    Err(SimError::ReturnBelowTotalLoss {
                        fund: fund.to_string(),
                        scenario,
                        adjusted,
                    })
                } else {
                    Ok(adjusted)
                }
            })
            .collect()
    }

    fn run_scenario(
        &self,
        scenario: Scenario,
        invested: &[(&str, f64, ReturnStatistics)],
        inputs: &SimulationInputs<'_>,
        observer: &dyn SimulationObserver,
    ) -> Result<CapitalTrajectory> {
        let months = inputs.schedule.months();
        let amount = inputs.schedule.monthly_amount();
        let insurance_rate = self.config.cost_drag.monthly_insurance_rate();

        let returns = self.scenario_returns(scenario, invested)?;
        let mut states: Vec<FundState> = invested
            .iter()
            .zip(&returns)
            .map(|((fund, percent, _), &r)| FundState::new(fund, amount * percent / 100.0, r))
            .collect();

        let monthly_invested: f64 = states.iter().map(|s| s.monthly_contribution).sum();
        let mut trajectory = CapitalTrajectory::new(scenario, months as usize);
        let mut fund_paths: Vec<Vec<f64>> = vec![Vec::with_capacity(months as usize); states.len()];
        let mut paid_in = 0.0;

        for month in 1..=months {
            let mut total = 0.0;

            for (state, path) in states.iter_mut().zip(fund_paths.iter_mut()) {
                let capital = state.advance_month(insurance_rate);
                path.push(capital);
                total += capital;

                observer.on_month(&MonthSnapshot {
                    scenario,
                    month,
                    fund_id: &state.fund_id,
                    adjusted_return: state.adjusted_return,
                    contribution: state.monthly_contribution,
                    capital,
                });
            }

            paid_in += monthly_invested;
            trajectory.total.push(total);
            trajectory.paid_in.push(paid_in);
        }

        trajectory.funds = states
            .into_iter()
            .map(|s| s.fund_id)
            .zip(fund_paths)
            .collect();

        observer.on_scenario_complete(&trajectory);
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn stats(pairs: &[(&str, f64, f64)]) -> BTreeMap<String, ReturnStatistics> {
        pairs
            .iter()
            .map(|&(f, m, v)| (f.to_string(), ReturnStatistics::new(m, v)))
            .collect()
    }

    fn run(
        config: SimulationConfig,
        plan: &AllocationPlan,
        statistics: &BTreeMap<String, ReturnStatistics>,
        years: u32,
    ) -> Result<SimulationResult> {
        let schedule = ContributionSchedule::new(100.0, years).unwrap();
        ScenarioSimulator::new(config).simulate(&SimulationInputs {
            plan,
            statistics,
            schedule: &schedule,
        })
    }

    #[test]
    fn test_zero_return_accumulates_contributions() {
        let plan = AllocationPlan::from_pairs([("A", 100.0)]).unwrap();
        let result = run(SimulationConfig::default(), &plan, &stats(&[("A", 0.0, 0.0)]), 1).unwrap();

        let expected = result.trajectory(Scenario::Expected).unwrap();
        assert_eq!(expected.months(), 12);
        assert_eq!(expected.final_capital(), 1200.0);
        assert_eq!(expected.total_paid_in(), 1200.0);
    }

    #[test]
    fn test_matches_closed_form_compounding() {
        let plan = AllocationPlan::from_pairs([("A", 100.0)]).unwrap();
        let result = run(SimulationConfig::default(), &plan, &stats(&[("A", 0.01, 0.0)]), 1).unwrap();

        let closed_form: f64 = (0..12).map(|t| 100.0 * 1.01_f64.powi(t)).sum();
        let expected = result.trajectory(Scenario::Expected).unwrap();
        assert_relative_eq!(expected.final_capital(), closed_form, max_relative = 1e-12);
    }

    #[test]
    fn test_scenario_ordering() {
        let plan = AllocationPlan::from_pairs([("A", 70.0), ("B", 30.0)]).unwrap();
        let statistics = stats(&[("A", 0.006, 0.04), ("B", 0.002, 0.01)]);

        for aggregation in [ReturnAggregation::PerFund, ReturnAggregation::PortfolioWeighted] {
            let config = SimulationConfig {
                return_aggregation: aggregation,
                cost_drag: CostDrag::Insurance { annual_rate: 0.01 },
            };
            let result = run(config, &plan, &statistics, 20).unwrap();

            let opt = result.trajectory(Scenario::Optimistic).unwrap().final_capital();
            let exp = result.trajectory(Scenario::Expected).unwrap().final_capital();
            let pes = result.trajectory(Scenario::Pessimistic).unwrap().final_capital();
            assert!(opt >= exp && exp >= pes, "{:?}: {} {} {}", aggregation, opt, exp, pes);
        }
    }

    #[test]
    fn test_deterministic() {
        let plan = AllocationPlan::from_pairs([("A", 50.0), ("B", 50.0)]).unwrap();
        let statistics = stats(&[("A", 0.007, 0.05), ("B", 0.001, 0.02)]);
        let config = SimulationConfig {
            return_aggregation: ReturnAggregation::PerFund,
            cost_drag: CostDrag::RebalancingAndInsurance {
                monthly_drag: DEFAULT_REBALANCING_DRAG,
                annual_rate: 0.015,
            },
        };

        let first = run(config, &plan, &statistics, 30).unwrap();
        let second = run(config, &plan, &statistics, 30).unwrap();
        assert_eq!(first.trajectories, second.trajectories);
    }

    #[test]
    fn test_missing_statistics_leave_share_uninvested() {
        let plan = AllocationPlan::from_pairs([("A", 60.0), ("B", 40.0)]).unwrap();
        let result = run(SimulationConfig::default(), &plan, &stats(&[("A", 0.0, 0.0)]), 1).unwrap();

        assert_eq!(result.invested_funds, vec!["A".to_string()]);
        assert_eq!(result.uninvested_percent, 40.0);
        let expected = result.trajectory(Scenario::Expected).unwrap();
        assert_relative_eq!(expected.total_paid_in(), 720.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_usable_data() {
        let plan = AllocationPlan::from_pairs([("A", 100.0)]).unwrap();
        let result = run(SimulationConfig::default(), &plan, &BTreeMap::new(), 1);
        assert!(matches!(result, Err(SimError::NoUsableData)));
    }

    #[test]
    fn test_total_loss_return_is_rejected() {
        let plan = AllocationPlan::from_pairs([("A", 100.0)]).unwrap();
        let result = run(SimulationConfig::default(), &plan, &stats(&[("A", 0.1, 1.2)]), 1);
        assert!(matches!(
            result,
            Err(SimError::ReturnBelowTotalLoss { scenario: Scenario::Pessimistic, .. })
        ));
    }

    #[test]
    fn test_portfolio_weighted_uses_weighted_statistics() {
        let plan = AllocationPlan::from_pairs([("A", 75.0), ("B", 25.0)]).unwrap();
        let statistics = stats(&[("A", 0.02, 0.04), ("B", 0.0, 0.0)]);
        let config = SimulationConfig {
            return_aggregation: ReturnAggregation::PortfolioWeighted,
            cost_drag: CostDrag::None,
        };
        let result = run(config, &plan, &statistics, 1).unwrap();

        // Portfolio optimistic return = 0.75 * 0.02 + 0.75 * 0.04 = 0.045
        let closed_form: f64 = (0..12).map(|t| 100.0 * 1.045_f64.powi(t)).sum();
        let optimistic = result.trajectory(Scenario::Optimistic).unwrap();
        assert_relative_eq!(optimistic.final_capital(), closed_form, max_relative = 1e-12);
    }

    #[test]
    fn test_rebalancing_drag_lowers_capital() {
        let plan = AllocationPlan::from_pairs([("A", 100.0)]).unwrap();
        let statistics = stats(&[("A", 0.005, 0.0)]);

        let plain = run(SimulationConfig::default(), &plan, &statistics, 10).unwrap();
        let dragged = run(
            SimulationConfig {
                return_aggregation: ReturnAggregation::PerFund,
                cost_drag: CostDrag::Rebalancing { monthly_drag: 0.001 },
            },
            &plan,
            &statistics,
            10,
        )
        .unwrap();

        let plain_final = plain.trajectory(Scenario::Expected).unwrap().final_capital();
        let dragged_final = dragged.trajectory(Scenario::Expected).unwrap().final_capital();
        assert!(dragged_final < plain_final);
    }

    #[derive(Default)]
    struct Recorder {
        months: Mutex<Vec<(Scenario, u32, f64)>>,
    }

    impl SimulationObserver for Recorder {
        fn on_month(&self, s: &MonthSnapshot<'_>) {
            self.months.lock().unwrap().push((s.scenario, s.month, s.capital));
        }
    }

    #[test]
    fn test_observer_does_not_change_results() {
        let plan = AllocationPlan::from_pairs([("A", 100.0)]).unwrap();
        let statistics = stats(&[("A", 0.004, 0.03)]);
        let schedule = ContributionSchedule::new(100.0, 2).unwrap();
        let inputs = SimulationInputs {
            plan: &plan,
            statistics: &statistics,
            schedule: &schedule,
        };
        let simulator = ScenarioSimulator::default();

        let recorder = Recorder::default();
        let observed = simulator.simulate_with_observer(&inputs, &recorder).unwrap();
        let plain = simulator.simulate(&inputs).unwrap();

        assert_eq!(observed.trajectories, plain.trajectories);
        assert_eq!(recorder.months.lock().unwrap().len(), 3 * 24);
    }
}
