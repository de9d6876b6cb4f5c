//! Fund reference data, price histories and return estimation

mod catalogue;
mod series;
mod returns;
pub mod loader;

pub use catalogue::{AssetClass, FundCatalogue, FundInfo, MAX_SELECTED_FUNDS};
pub use series::{FundSeries, PricePoint};
pub use returns::{estimate_all, estimate_returns, FundExclusion, ReturnStatistics};
pub use loader::{fetch_all, CsvPriceSource, InMemoryPriceSource, PriceSource};
