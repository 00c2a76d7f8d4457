use argent::advisor::StrategyRequest;
use argent::domain::strategy::RiskProfile;
use serde::Deserialize;
use shared::Result;

/// `?symbols=BTC,ETH`
#[derive(Debug, Default, Deserialize)]
pub struct SymbolsQuery {
    pub symbols: Option<String>,
}

impl SymbolsQuery {
    /// Comma-separated list with blanks dropped; empty when absent
    pub fn list(&self) -> Vec<String> {
        self.symbols
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoricalQuery {
    pub interval: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePortfolioRequest {
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertHoldingRequest {
    pub quantity: f64,
    #[serde(default)]
    pub cost_basis_usd: f64,
}

#[derive(Debug, Deserialize)]
pub struct SuggestStrategyRequest {
    pub risk_profile: String,
    pub amount_usd: f64,
    pub horizon_months: u32,
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

impl SuggestStrategyRequest {
    pub fn into_domain(self) -> Result<StrategyRequest> {
        Ok(StrategyRequest {
            risk_profile: self.risk_profile.parse::<RiskProfile>()?,
            amount_usd: self.amount_usd,
            horizon_months: self.horizon_months,
            symbols: self.symbols,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassifyIntentRequest {
    pub text: String,
}
