//! Error types for the simulation core

use thiserror::Error;

use crate::simulation::Scenario;

/// Errors raised by validation, data loading and simulation
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Allocation must sum to exactly 100%, got {sum}%")]
    AllocationSum { sum: f64 },

    #[error("Allocation for fund {fund} is negative: {percent}%")]
    NegativeAllocation { fund: String, percent: f64 },

    #[error("Allocation for fund {fund} is not a finite number: {percent}")]
    InvalidAllocation { fund: String, percent: f64 },

    #[error("Unknown fund: {0}")]
    UnknownFund(String),

    #[error("At most {max} funds can be selected, got {selected}")]
    TooManyFunds { max: usize, selected: usize },

    #[error("Invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Fund {fund} has {points} price points, at least 2 are required")]
    InsufficientData { fund: String, points: usize },

    #[error("Fund {fund} has an invalid price {price} at position {index}")]
    InvalidPrice { fund: String, index: usize, price: f64 },

    #[error("Fund {fund} return statistics are not finite (mean {mean_return}, volatility {volatility})")]
    NonFiniteStatistics {
        fund: String,
        mean_return: f64,
        volatility: f64,
    },

    #[error("Fund {fund} prices are not in chronological order")]
    UnorderedSeries { fund: String },

    #[error("No usable price data for any selected fund")]
    NoUsableData,

    #[error(
        "Adjusted monthly return {adjusted} for {fund} under {scenario} is at or below -100%"
    )]
    ReturnBelowTotalLoss {
        fund: String,
        scenario: Scenario,
        adjusted: f64,
    },

    #[error("Price fetch for {fund} failed: {reason}")]
    Fetch { fund: String, reason: String },

    #[error("Price fetch for {fund} timed out after {seconds}s")]
    FetchTimeout { fund: String, seconds: u64 },

    #[error("Missing column {column} in {source_name}")]
    MissingColumn {
        column: &'static str,
        source_name: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}
