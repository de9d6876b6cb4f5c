//! Deterministic return scenarios

use serde::{Deserialize, Serialize};

/// Return-adjustment rule applied to historical statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scenario {
    Optimistic,
    Expected,
    Pessimistic,
}

impl Scenario {
    /// All scenarios in reporting order
    pub const ALL: [Scenario; 3] = [Scenario::Optimistic, Scenario::Expected, Scenario::Pessimistic];

    /// Shift the mean return by one volatility up, none, or one down
    pub fn adjusted_return(self, mean_return: f64, volatility: f64) -> f64 {
        match self {
            Scenario::Optimistic => mean_return + volatility,
            Scenario::Expected => mean_return,
            Scenario::Pessimistic => mean_return - volatility,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Optimistic => "Optimistic",
            Scenario::Expected => "Expected",
            Scenario::Pessimistic => "Pessimistic",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjusted_returns() {
        assert_eq!(Scenario::Optimistic.adjusted_return(0.01, 0.04), 0.05);
        assert_eq!(Scenario::Expected.adjusted_return(0.01, 0.04), 0.01);
        assert_eq!(Scenario::Pessimistic.adjusted_return(0.01, 0.04), -0.03);
    }
}
