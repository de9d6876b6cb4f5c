//! One-parameter sweeps of the guarantee curve

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::curve::{GuaranteeCurve, GuaranteeGrid, GuaranteeValuer};

/// Volatilities compared in the default volatility sweep
pub const DEFAULT_VOLATILITY_SWEEP: [f64; 4] = [0.10, 0.15, 0.20, 0.25];

/// Maturities (years) compared in the default maturity sweep
pub const DEFAULT_MATURITY_SWEEP: [f64; 4] = [10.0, 20.0, 30.0, 40.0];

/// Pricing parameter varied by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    Volatility,
    Maturity,
}

impl SweepParameter {
    /// Human-readable label for a swept value
    pub fn label(self, value: f64) -> String {
        match self {
            SweepParameter::Volatility => format!("Volatility: {:.0}%", value * 100.0),
            SweepParameter::Maturity => format!("Maturity: {} years", value),
        }
    }
}

/// Guarantee curve tagged with the swept value that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCurve {
    pub parameter: SweepParameter,
    pub value: f64,
    pub curve: GuaranteeCurve,
}

/// Re-prices the guarantee curve while varying one parameter
#[derive(Debug, Clone)]
pub struct SensitivityAnalyzer {
    base: GuaranteeValuer,
    grid: GuaranteeGrid,
}

impl SensitivityAnalyzer {
    pub fn new(base: GuaranteeValuer, grid: GuaranteeGrid) -> Self {
        Self { base, grid }
    }

    /// One curve per value, all other parameters held at the base valuer's
    pub fn sweep(&self, parameter: SweepParameter, values: &[f64]) -> Vec<SensitivityCurve> {
        values
            .par_iter()
            .map(|&value| {
                let valuer = match parameter {
                    SweepParameter::Volatility => self.base.with_volatility(value),
                    SweepParameter::Maturity => self.base.with_maturity(value),
                };
                log::debug!("Pricing guarantee curve for {}", parameter.label(value));
                SensitivityCurve {
                    parameter,
                    value,
                    curve: valuer.curve(&self.grid),
                }
            })
            .collect()
    }

    pub fn sweep_volatility(&self, volatilities: &[f64]) -> Vec<SensitivityCurve> {
        self.sweep(SweepParameter::Volatility, volatilities)
    }

    pub fn sweep_maturity(&self, maturities: &[f64]) -> Vec<SensitivityCurve> {
        self.sweep(SweepParameter::Maturity, maturities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SensitivityAnalyzer {
        SensitivityAnalyzer::new(
            GuaranteeValuer::new(24_000.0, 20.0, 0.02, 0.15),
            GuaranteeGrid::standard(),
        )
    }

    #[test]
    fn test_volatility_sweep_orders_curves() {
        let curves = analyzer().sweep_volatility(&DEFAULT_VOLATILITY_SWEEP);
        assert_eq!(curves.len(), 4);
        assert_eq!(curves[0].value, 0.10);
        assert_eq!(curves[3].value, 0.25);

        // Higher volatility makes the full guarantee more expensive
        let full: Vec<f64> = curves.iter().map(|c| c.curve.price_at(1.0).unwrap()).collect();
        assert!(full.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_maturity_sweep_keeps_other_parameters() {
        let curves = analyzer().sweep_maturity(&DEFAULT_MATURITY_SWEEP);
        assert_eq!(curves.len(), 4);

        let direct = GuaranteeValuer::new(24_000.0, 30.0, 0.02, 0.15).curve(&GuaranteeGrid::standard());
        assert_eq!(curves[2].parameter, SweepParameter::Maturity);
        assert_eq!(curves[2].curve, direct);

        for c in &curves {
            assert_eq!(c.curve.price_at(0.0), Some(0.0));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SweepParameter::Volatility.label(0.15), "Volatility: 15%");
        assert_eq!(SweepParameter::Maturity.label(30.0), "Maturity: 30 years");
    }
}
