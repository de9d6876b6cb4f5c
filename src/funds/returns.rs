//! Return statistics estimated from historical prices

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::series::FundSeries;
use crate::error::{Result, SimError};

/// Mean and volatility of periodic simple returns for one fund
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatistics {
    /// Arithmetic mean of period returns
    pub mean_return: f64,

    /// Sample standard deviation (n-1) of period returns
    pub volatility: f64,

    /// Number of returns the estimate is based on
    pub observations: usize,
}

impl ReturnStatistics {
    pub fn new(mean_return: f64, volatility: f64) -> Self {
        Self {
            mean_return,
            volatility,
            observations: 0,
        }
    }
}

/// A fund left out of a run, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundExclusion {
    pub fund: String,
    pub reason: String,
}

/// Estimate mean and volatility of simple period returns
///
/// Returns are r_t = p_t / p_{t-1} - 1 over the whole series. A series with a
/// single return has volatility 0.
pub fn estimate_returns(series: &FundSeries) -> Result<ReturnStatistics> {
    if !series.is_usable() {
        return Err(SimError::InsufficientData {
            fund: series.fund_id().to_string(),
            points: series.len(),
        });
    }

    if let Some((index, point)) = series
        .points()
        .iter()
        .enumerate()
        .find(|(_, p)| !p.price.is_finite() || p.price <= 0.0)
    {
        return Err(SimError::InvalidPrice {
            fund: series.fund_id().to_string(),
            index,
            price: point.price,
        });
    }

    let returns: Vec<f64> = series
        .points()
        .windows(2)
        .map(|w| w[1].price / w[0].price - 1.0)
        .collect();

    let n = returns.len() as f64;
    let mean_return = returns.iter().sum::<f64>() / n;

    let volatility = if returns.len() > 1 {
        let sum_sq: f64 = returns.iter().map(|r| (r - mean_return).powi(2)).sum();
        (sum_sq / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    if !mean_return.is_finite() || !volatility.is_finite() {
        return Err(SimError::NonFiniteStatistics {
            fund: series.fund_id().to_string(),
            mean_return,
            volatility,
        });
    }

    Ok(ReturnStatistics {
        mean_return,
        volatility,
        observations: returns.len(),
    })
}

/// Estimate statistics for every series, excluding funds whose estimate fails
pub fn estimate_all(
    series: &[FundSeries],
) -> (BTreeMap<String, ReturnStatistics>, Vec<FundExclusion>) {
    let estimates: Vec<(String, Result<ReturnStatistics>)> = series
        .par_iter()
        .map(|s| (s.fund_id().to_string(), estimate_returns(s)))
        .collect();

    let mut statistics = BTreeMap::new();
    let mut exclusions = Vec::new();

    for (fund, estimate) in estimates {
        match estimate {
            Ok(stats) => {
                log::debug!(
                    "{}: mean {:.6}, volatility {:.6} over {} returns",
                    fund,
                    stats.mean_return,
                    stats.volatility,
                    stats.observations
                );
                statistics.insert(fund, stats);
            }
            Err(e) => {
                log::warn!("Excluding {} from run: {}", fund, e);
                exclusions.push(FundExclusion {
                    fund,
                    reason: e.to_string(),
                });
            }
        }
    }

    (statistics, exclusions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(prices: &[f64]) -> FundSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        FundSeries::monthly("TEST", start, prices).unwrap()
    }

    #[test]
    fn test_mean_and_sample_volatility() {
        // Returns: +10%, -10%, +20%
        let stats = estimate_returns(&series(&[100.0, 110.0, 99.0, 118.8])).unwrap();

        assert_eq!(stats.observations, 3);
        assert_relative_eq!(stats.mean_return, 0.2 / 3.0, epsilon = 1e-12);

        let m: f64 = 0.2 / 3.0;
        let expected_var = ((0.1 - m).powi(2) + (-0.1 - m).powi(2) + (0.2 - m).powi(2)) / 2.0;
        assert_relative_eq!(stats.volatility, expected_var.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_prices() {
        let stats = estimate_returns(&series(&[50.0; 12])).unwrap();
        assert_eq!(stats.mean_return, 0.0);
        assert_eq!(stats.volatility, 0.0);
    }

    #[test]
    fn test_single_return_has_zero_volatility() {
        let stats = estimate_returns(&series(&[100.0, 105.0])).unwrap();
        assert_relative_eq!(stats.mean_return, 0.05, epsilon = 1e-12);
        assert_eq!(stats.volatility, 0.0);
    }

    #[test]
    fn test_short_series_fails() {
        assert!(matches!(
            estimate_returns(&series(&[100.0])),
            Err(SimError::InsufficientData { points: 1, .. })
        ));
        assert!(matches!(
            estimate_returns(&series(&[])),
            Err(SimError::InsufficientData { points: 0, .. })
        ));
    }

    #[test]
    fn test_zero_price_is_rejected() {
        assert!(matches!(
            estimate_returns(&series(&[100.0, 0.0, 10.0])),
            Err(SimError::InvalidPrice { index: 1, .. })
        ));
    }

    #[test]
    fn test_overflowing_statistics_are_rejected() {
        // Returns of 1e200 - 1 and 0 overflow the squared deviations
        assert!(matches!(
            estimate_returns(&series(&[1e-200, 1.0, 1.0])),
            Err(SimError::NonFiniteStatistics { .. })
        ));
    }

    #[test]
    fn test_estimate_all_excludes_bad_funds() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let good = FundSeries::monthly("GOOD", start, &[1.0, 1.1, 1.2]).unwrap();
        let short = FundSeries::monthly("SHORT", start, &[1.0]).unwrap();
        let extreme = FundSeries::monthly("EXTREME", start, &[1e-200, 1.0, 1.0]).unwrap();

        let (stats, exclusions) = estimate_all(&[good, short, extreme]);

        assert_eq!(stats.len(), 1);
        assert!(stats.contains_key("GOOD"));
        let excluded: Vec<&str> = exclusions.iter().map(|e| e.fund.as_str()).collect();
        assert_eq!(excluded, vec!["SHORT", "EXTREME"]);
    }
}
