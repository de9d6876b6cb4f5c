//! Price-series loading
//!
//! Reads monthly price downloads (Date plus Adj Close or Close columns) and
//! fetches series for a selection of funds through a [`PriceSource`], bounding
//! each fetch with a timeout.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::catalogue::FundInfo;
use super::returns::FundExclusion;
use super::series::{FundSeries, PricePoint};
use crate::error::{Result, SimError};

/// Default bound on a single fund fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplier of historical prices for a fund
pub trait PriceSource: Send + Sync {
    fn fetch(&self, fund: &FundInfo) -> Result<FundSeries>;
}

/// Reads `<dir>/<ticker>.csv` for each fund
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, fund: &FundInfo) -> Result<FundSeries> {
        load_price_series(&self.dir.join(format!("{}.csv", fund.id)), &fund.id)
    }
}

/// Serves pre-loaded series, keyed by fund id
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, FundSeries>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: FundSeries) -> Self {
        self.series.insert(series.fund_id().to_string(), series);
        self
    }
}

impl PriceSource for InMemoryPriceSource {
    fn fetch(&self, fund: &FundInfo) -> Result<FundSeries> {
        self.series.get(&fund.id).cloned().ok_or_else(|| SimError::Fetch {
            fund: fund.id.clone(),
            reason: "no series available".to_string(),
        })
    }
}

/// Load a price series from a CSV file
pub fn load_price_series(path: &Path, fund_id: &str) -> Result<FundSeries> {
    let file = std::fs::File::open(path)?;
    load_price_series_from_reader(file, fund_id, &path.display().to_string())
}

/// Load a price series from any reader
///
/// Prefers the `Adj Close` column and falls back to `Close`. Rows without a
/// parseable price are dropped; rows are sorted by date.
pub fn load_price_series_from_reader<R: std::io::Read>(
    reader: R,
    fund_id: &str,
    source_name: &str,
) -> Result<FundSeries> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let column = |name: &'static str| headers.iter().position(|h| h.trim() == name);

    let date_idx = column("Date").ok_or_else(|| SimError::MissingColumn {
        column: "Date",
        source_name: source_name.to_string(),
    })?;
    let price_idx = column("Adj Close")
        .or_else(|| column("Close"))
        .ok_or_else(|| SimError::MissingColumn {
            column: "Close",
            source_name: source_name.to_string(),
        })?;

    let mut points = Vec::new();
    let mut dropped = 0usize;

    for result in csv_reader.records() {
        let record = result?;
        let date = parse_date(&record[date_idx])?;

        match record[price_idx].trim().parse::<f64>() {
            Ok(price) if price.is_finite() => points.push(PricePoint::new(date, price)),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("{}: dropped {} rows without a price", source_name, dropped);
    }

    points.sort_by_key(|p| p.date);
    FundSeries::new(fund_id, points)
}

/// Parse the date part of a `YYYY-MM-DD[ time]` field
fn parse_date(field: &str) -> Result<NaiveDate> {
    let field = field.trim();
    let date_part = field.get(..10).unwrap_or(field);
    Ok(NaiveDate::parse_from_str(date_part, "%Y-%m-%d")?)
}

/// Fetch series for all funds concurrently
///
/// A fund whose fetch fails or does not complete within `timeout` is excluded
/// from the run instead of failing the batch.
pub fn fetch_all(
    source: Arc<dyn PriceSource>,
    funds: &[FundInfo],
    timeout: Duration,
) -> (Vec<FundSeries>, Vec<FundExclusion>) {
    let deadline = Instant::now() + timeout;

    let pending: Vec<(String, mpsc::Receiver<Result<FundSeries>>)> = funds
        .iter()
        .map(|fund| {
            let (tx, rx) = mpsc::channel();
            let source = Arc::clone(&source);
            let fund = fund.clone();
            let id = fund.id.clone();
            thread::spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(source.fetch(&fund));
            });
            (id, rx)
        })
        .collect();

    let mut series = Vec::new();
    let mut exclusions = Vec::new();

    for (fund, rx) in pending {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let outcome = match rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SimError::FetchTimeout {
                fund: fund.clone(),
                seconds: timeout.as_secs(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(SimError::Fetch {
                fund: fund.clone(),
                reason: "source terminated".to_string(),
            }),
        };

        match outcome {
            Ok(s) => {
                log::info!("Fetched {} price points for {}", s.len(), fund);
                series.push(s);
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

    (series, exclusions)
}
