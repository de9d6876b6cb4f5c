//! Closed-form European put pricing

use statrs::function::erf::erfc;

/// Standard normal cumulative distribution function
///
/// Φ(x) = erfc(-x / √2) / 2, accurate to about 1e-12 with the `statrs`
/// error function.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Black-Scholes price of a European put
///
/// Non-positive spot, strike, maturity or volatility price at zero.
pub fn black_scholes_put(spot: f64, strike: f64, maturity: f64, rate: f64, volatility: f64) -> f64 {
    if spot <= 0.0 || strike <= 0.0 || maturity <= 0.0 || volatility <= 0.0 {
        return 0.0;
    }

    let sigma_sqrt_t = volatility * maturity.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * maturity) / sigma_sqrt_t;
    let d2 = d1 - sigma_sqrt_t;

    let price = strike * (-rate * maturity).exp() * norm_cdf(-d2) - spot * norm_cdf(-d1);

    // Rounding can leave deep out-of-the-money puts a hair below zero
    price.max(0.0)
}
