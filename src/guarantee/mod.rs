//! Capital-guarantee pricing
//!
//! The contribution guarantee is valued as a European put on the invested
//! capital with strike equal to the protected amount:
//! - [`black_scholes_put`]: closed-form put price
//! - [`GuaranteeValuer`]: price as % of the investment over a level grid
//! - [`SensitivityAnalyzer`]: families of curves for alternative volatilities or maturities

mod black_scholes;
mod curve;
mod sensitivity;

pub use black_scholes::{black_scholes_put, norm_cdf};
pub use curve::{
    GuaranteeCurve, GuaranteeGrid, GuaranteePoint, GuaranteeValuer, DEFAULT_PRICING_VOLATILITY,
    DEFAULT_RISK_FREE_RATE,
};
pub use sensitivity::{
    SensitivityAnalyzer, SensitivityCurve, SweepParameter, DEFAULT_MATURITY_SWEEP,
    DEFAULT_VOLATILITY_SWEEP,
};
