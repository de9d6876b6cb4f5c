//! Running capital of a single fund during a scenario

/// State of one fund's capital account within a scenario run
#[derive(Debug, Clone)]
pub struct FundState {
    /// Fund identifier
    pub fund_id: String,

    /// Share of each contribution invested in this fund
    pub monthly_contribution: f64,

    /// Monthly return after scenario shift and rebalancing drag
    pub adjusted_return: f64,

    /// Capital at the end of the last processed month
    pub capital: f64,
}

impl FundState {
    pub fn new(fund_id: &str, monthly_contribution: f64, adjusted_return: f64) -> Self {
        Self {
            fund_id: fund_id.to_string(),
            monthly_contribution,
            adjusted_return,
            capital: 0.0,
        }
    }

    /// Roll the account forward one month and return the new capital
    ///
    /// Growth is applied first, then the insurance deduction on the grown
    /// balance, then the new contribution is added.
    pub fn advance_month(&mut self, monthly_insurance_rate: f64) -> f64 {
        self.capital *= 1.0 + self.adjusted_return;
        if monthly_insurance_rate > 0.0 {
            self.capital *= 1.0 - monthly_insurance_rate;
        }
        self.capital += self.monthly_contribution;
        self.capital
    }
}
