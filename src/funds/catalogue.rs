//! Static fund reference data
//!
//! The catalogue is read once at start-up and injected into the runner. It is
//! never mutated during a run.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SimError};

/// Maximum number of funds a single contract can invest in
pub const MAX_SELECTED_FUNDS: usize = 5;

/// Broad asset class of a fund, used by the tax-rate resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Bond,
}

impl AssetClass {
    pub fn is_fixed_income(self) -> bool {
        matches!(self, AssetClass::Bond)
    }
}

/// One entry of the fund catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundInfo {
    /// Market ticker, also used as the fund identifier
    #[serde(rename = "Ticker")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "AssetClass")]
    pub asset_class: AssetClass,
    #[serde(rename = "Description")]
    pub description: String,
}

impl FundInfo {
    pub fn new(id: &str, name: &str, asset_class: AssetClass, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            asset_class,
            description: description.to_string(),
        }
    }
}

/// Immutable table of the funds offered by the product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundCatalogue {
    funds: Vec<FundInfo>,
}

impl FundCatalogue {
    pub fn new(funds: Vec<FundInfo>) -> Self {
        Self { funds }
    }

    /// The five funds offered by the product
    pub fn default_catalogue() -> Self {
        Self::new(vec![
            FundInfo::new(
                "URTH",
                "iShares MSCI World ETF",
                AssetClass::Equity,
                "Global developed markets equity exposure.",
            ),
            FundInfo::new(
                "SPY",
                "SPDR S&P 500 ETF Trust",
                AssetClass::Equity,
                "Large-cap US equity exposure.",
            ),
            FundInfo::new(
                "IEGA.DE",
                "iShares Euro Govt Bond 10-25yr UCITS ETF",
                AssetClass::Bond,
                "Eurozone government bonds with 10-25 years maturity.",
            ),
            FundInfo::new(
                "VWRD.L",
                "Vanguard FTSE All-World UCITS ETF",
                AssetClass::Equity,
                "Global diversified equity exposure.",
            ),
            FundInfo::new(
                "XMME.DE",
                "Xtrackers MSCI Emerging Markets UCITS ETF",
                AssetClass::Equity,
                "Emerging markets equity exposure.",
            ),
        ])
    }

    /// Load the catalogue from a CSV with columns Ticker,Name,AssetClass,Description
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load the catalogue from any reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut funds = Vec::new();

        for result in csv_reader.deserialize() {
            let fund: FundInfo = result?;
            funds.push(fund);
        }

        Ok(Self::new(funds))
    }

    pub fn get(&self, id: &str) -> Option<&FundInfo> {
        self.funds.iter().find(|f| f.id == id)
    }

    /// Look up a fund, failing on unknown identifiers
    pub fn require(&self, id: &str) -> Result<&FundInfo> {
        self.get(id).ok_or_else(|| SimError::UnknownFund(id.to_string()))
    }

    pub fn funds(&self) -> &[FundInfo] {
        &self.funds
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}

impl Default for FundCatalogue {
    fn default() -> Self {
        Self::default_catalogue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue() {
        let catalogue = FundCatalogue::default_catalogue();
        assert_eq!(catalogue.len(), 5);

        let bond = catalogue.get("IEGA.DE").unwrap();
        assert_eq!(bond.asset_class, AssetClass::Bond);
        assert!(bond.asset_class.is_fixed_income());

        assert!(catalogue.require("NOPE").is_err());
    }

    #[test]
    fn test_catalogue_from_csv() {
        let data = "Ticker,Name,AssetClass,Description\n\
                    AAA,Alpha Equity,Equity,Some equity fund\n\
                    BBB,Beta Bonds,Bond,Some bond fund\n";

        let catalogue = FundCatalogue::from_reader(data.as_bytes()).unwrap();
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.funds()[1].name, "Beta Bonds");
        assert_eq!(catalogue.get("BBB").unwrap().asset_class, AssetClass::Bond);
    }
}
