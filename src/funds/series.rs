//! Historical price series for a single fund

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// One observation of a fund price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Chronologically ordered price history of one fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSeries {
    fund_id: String,
    points: Vec<PricePoint>,
}

impl FundSeries {
    /// Build a series, rejecting observations that go back in time
    pub fn new(fund_id: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let fund_id = fund_id.into();
        if points.windows(2).any(|w| w[1].date < w[0].date) {
            return Err(SimError::UnorderedSeries { fund: fund_id });
        }
        Ok(Self { fund_id, points })
    }

    /// Build a series from bare prices, one per month starting at `start`
    pub fn monthly(fund_id: impl Into<String>, start: NaiveDate, prices: &[f64]) -> Result<Self> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                let date = start
                    .checked_add_months(chrono::Months::new(i as u32))
                    .unwrap_or(start);
                PricePoint::new(date, price)
            })
            .collect();
        Self::new(fund_id, points)
    }

    pub fn fund_id(&self) -> &str {
        &self.fund_id
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_usable(&self) -> bool {
        self.points.len() >= 2
    }
}
