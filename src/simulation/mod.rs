//! Deterministic scenario projection of monthly contributions

mod scenario;
mod state;
mod engine;
mod trajectory;
mod observer;

pub use scenario::Scenario;
pub use state::FundState;
pub use engine::{
    CostDrag, ReturnAggregation, ScenarioSimulator, SimulationConfig, SimulationInputs,
    DEFAULT_REBALANCING_DRAG,
};
pub use trajectory::{CapitalTrajectory, SimulationResult, TrajectoryRow};
pub use observer::{LogObserver, MonthSnapshot, NoopObserver, SimulationObserver};
