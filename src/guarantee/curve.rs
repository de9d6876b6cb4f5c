//! Guarantee cost as a function of the protected level

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::black_scholes::black_scholes_put;
use crate::contract::ContributionSchedule;

/// Default risk-free rate for guarantee pricing
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Default volatility assumption for guarantee pricing
pub const DEFAULT_PRICING_VOLATILITY: f64 = 0.15;

/// Guarantee levels at which the curve is evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeGrid {
    levels: Vec<f64>,
}

impl GuaranteeGrid {
    /// 0% to 100% in 5% steps
    pub fn standard() -> Self {
        Self::evenly_spaced(20)
    }

    /// `steps + 1` levels from 0 to 1 inclusive
    pub fn evenly_spaced(steps: u32) -> Self {
        let steps = steps.max(1);
        let levels = (0..=steps).map(|i| i as f64 / steps as f64).collect();
        Self { levels }
    }

    /// Custom levels, sorted ascending
    pub fn from_levels(mut levels: Vec<f64>) -> Self {
        levels.sort_by(f64::total_cmp);
        Self { levels }
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }
}

impl Default for GuaranteeGrid {
    fn default() -> Self {
        Self::standard()
    }
}

/// One point of a guarantee curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuaranteePoint {
    /// Protected fraction of the investment (0.0 - 1.0)
    #[serde(rename = "GuaranteeLevel")]
    pub level: f64,

    /// Put price as a percentage of the investment
    #[serde(rename = "OptionPricePct")]
    pub price_percent: f64,
}

/// Guarantee cost over a grid of levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeCurve {
    pub points: Vec<GuaranteePoint>,
}

impl GuaranteeCurve {
    pub fn price_at(&self, level: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|p| (p.level - level).abs() < 1e-12)
            .map(|p| p.price_percent)
    }
}

/// Prices the contribution guarantee as a European put on the investment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeValuer {
    /// Underlying value S
    pub initial_investment: f64,
    /// Maturity T in years
    pub maturity_years: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
}

impl GuaranteeValuer {
    pub fn new(initial_investment: f64, maturity_years: f64, risk_free_rate: f64, volatility: f64) -> Self {
        Self {
            initial_investment,
            maturity_years,
            risk_free_rate,
            volatility,
        }
    }

    /// Valuer for a contract: S is the sum of all contributions, T its horizon
    pub fn for_schedule(schedule: &ContributionSchedule, risk_free_rate: f64, volatility: f64) -> Self {
        Self::new(
            schedule.total_contributions(),
            schedule.horizon_years() as f64,
            risk_free_rate,
            volatility,
        )
    }

    pub fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    pub fn with_maturity(self, maturity_years: f64) -> Self {
        Self {
            maturity_years,
            ..self
        }
    }

    /// Put price for `level` as a percentage of the investment
    pub fn price_percent(&self, level: f64) -> f64 {
        if level == 0.0 || self.initial_investment <= 0.0 {
            return 0.0;
        }

        let strike = self.initial_investment * level;
        let price = black_scholes_put(
            self.initial_investment,
            strike,
            self.maturity_years,
            self.risk_free_rate,
            self.volatility,
        );
        price / self.initial_investment * 100.0
    }

    /// Evaluate every grid level
    pub fn curve(&self, grid: &GuaranteeGrid) -> GuaranteeCurve {
        let points = grid
            .levels()
            .par_iter()
            .map(|&level| GuaranteePoint {
                level,
                price_percent: self.price_percent(level),
            })
            .collect();
        GuaranteeCurve { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn valuer() -> GuaranteeValuer {
        GuaranteeValuer::new(24_000.0, 20.0, DEFAULT_RISK_FREE_RATE, DEFAULT_PRICING_VOLATILITY)
    }

    #[test]
    fn test_standard_grid() {
        let grid = GuaranteeGrid::standard();
        assert_eq!(grid.levels().len(), 21);
        assert_eq!(grid.levels()[0], 0.0);
        assert_relative_eq!(grid.levels()[1], 0.05);
        assert_eq!(grid.levels()[20], 1.0);
    }

    #[test]
    fn test_zero_level_prices_zero() {
        for (s, t, r, v) in [(24_000.0, 20.0, 0.02, 0.15), (1.0, 1.0, -0.01, 0.5), (0.0, 0.0, 0.0, 0.0)] {
            assert_eq!(GuaranteeValuer::new(s, t, r, v).price_percent(0.0), 0.0);
        }
    }

    #[test]
    fn test_monotonic_in_level() {
        let curve = valuer().curve(&GuaranteeGrid::standard());
        assert_eq!(curve.points.len(), 21);

        for pair in curve.points.windows(2) {
            assert!(pair[1].level > pair[0].level);
            assert!(pair[1].price_percent >= pair[0].price_percent);
        }
        assert!(curve.price_at(1.0).unwrap() > 0.0);
    }

    #[test]
    fn test_monotonic_in_volatility() {
        let grid = GuaranteeGrid::standard();
        let base = valuer();
        for level in grid.levels().iter().filter(|&&l| l > 0.0) {
            let mut prev = 0.0;
            for vol in [0.05, 0.10, 0.15, 0.20, 0.25, 0.40] {
                let price = base.with_volatility(vol).price_percent(*level);
                assert!(price >= prev, "level {} vol {}: {} < {}", level, vol, price, prev);
                prev = price;
            }
        }
    }

    #[test]
    fn test_degenerate_valuer_prices_zero() {
        let grid = GuaranteeGrid::standard();
        for v in [valuer().with_volatility(0.0), valuer().with_maturity(0.0)] {
            assert!(v.curve(&grid).points.iter().all(|p| p.price_percent == 0.0));
        }
    }

    #[test]
    fn test_for_schedule() {
        let schedule = ContributionSchedule::new(100.0, 20).unwrap();
        let v = GuaranteeValuer::for_schedule(&schedule, 0.02, 0.15);
        assert_eq!(v.initial_investment, 24_000.0);
        assert_eq!(v.maturity_years, 20.0);
    }
}
