use super::market::MarketService;
use crate::domain::normalize_symbol;
use crate::domain::portfolio::{Holding, Portfolio, PortfolioValuation, PositionValuation};
use chrono::Utc;
use shared::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub const DEMO_PORTFOLIO_ID: &str = "demo";

/// In-memory demo portfolios valued against live (or mock) market data
#[derive(Clone)]
pub struct PortfolioService {
    portfolios: Arc<RwLock<HashMap<String, Portfolio>>>,
    market: Arc<MarketService>,
}

impl PortfolioService {
    pub fn new(market: Arc<MarketService>) -> Self {
        Self {
            portfolios: Arc::new(RwLock::new(HashMap::new())),
            market,
        }
    }

    /// Service seeded with the `demo` portfolio
    pub fn with_demo_portfolio(market: Arc<MarketService>) -> Self {
        let now = Utc::now();
        let demo = Portfolio {
            id: DEMO_PORTFOLIO_ID.to_string(),
            owner: "demo-user".to_string(),
            holdings: vec![
                Holding {
                    symbol: "BTC".into(),
                    quantity: 0.5,
                    cost_basis_usd: 21_000.0,
                },
                Holding {
                    symbol: "ETH".into(),
                    quantity: 4.0,
                    cost_basis_usd: 7_200.0,
                },
                Holding {
                    symbol: "SOL".into(),
                    quantity: 50.0,
                    cost_basis_usd: 4_500.0,
                },
            ],
            created_at: now,
            updated_at: now,
        };

        let mut portfolios = HashMap::new();
        portfolios.insert(demo.id.clone(), demo);
        Self {
            portfolios: Arc::new(RwLock::new(portfolios)),
            market,
        }
    }

    pub async fn create(&self, owner: &str) -> Result<Portfolio> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(Error::InvalidInput("owner cannot be empty".into()));
        }

        let now = Utc::now();
        let portfolio = Portfolio {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            holdings: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.portfolios
            .write()
            .await
            .insert(portfolio.id.clone(), portfolio.clone());
        info!("Created portfolio {} for {}", portfolio.id, portfolio.owner);
        Ok(portfolio)
    }

    pub async fn list(&self) -> Vec<Portfolio> {
        let mut portfolios: Vec<Portfolio> =
            self.portfolios.read().await.values().cloned().collect();
        portfolios.sort_by(|a, b| a.id.cmp(&b.id));
        portfolios
    }

    pub async fn get(&self, id: &str) -> Result<Portfolio> {
        self.portfolios
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("portfolio '{id}'")))
    }

    /// Insert the holding, replacing any existing position in the same symbol
    pub async fn upsert_holding(&self, id: &str, holding: Holding) -> Result<Portfolio> {
        let symbol = normalize_symbol(&holding.symbol)?;
        if !holding.quantity.is_finite() || holding.quantity <= 0.0 {
            return Err(Error::InvalidInput("quantity must be a positive number".into()));
        }
        if !holding.cost_basis_usd.is_finite() || holding.cost_basis_usd < 0.0 {
            return Err(Error::InvalidInput(
                "cost_basis_usd must be zero or a positive number".into(),
            ));
        }

        let mut portfolios = self.portfolios.write().await;
        let portfolio = portfolios
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("portfolio '{id}'")))?;

        let holding = Holding { symbol, ..holding };
        match portfolio
            .holdings
            .iter_mut()
            .find(|h| h.symbol == holding.symbol)
        {
            Some(existing) => *existing = holding,
            None => portfolio.holdings.push(holding),
        }
        portfolio.updated_at = Utc::now();

        Ok(portfolio.clone())
    }

    pub async fn remove_holding(&self, id: &str, symbol: &str) -> Result<Portfolio> {
        let symbol = normalize_symbol(symbol)?;

        let mut portfolios = self.portfolios.write().await;
        let portfolio = portfolios
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("portfolio '{id}'")))?;

        let before = portfolio.holdings.len();
        portfolio.holdings.retain(|h| h.symbol != symbol);
        if portfolio.holdings.len() == before {
            return Err(Error::NotFound(format!(
                "holding '{symbol}' in portfolio '{id}'"
            )));
        }
        portfolio.updated_at = Utc::now();

        Ok(portfolio.clone())
    }

    /// Value every holding at the current resolved price.
    ///
    /// A holding whose price cannot be resolved fails the whole valuation.
    pub async fn valuation(&self, id: &str) -> Result<PortfolioValuation> {
        let portfolio = self.get(id).await?;

        if portfolio.holdings.is_empty() {
            return Ok(PortfolioValuation {
                portfolio_id: portfolio.id,
                positions: Vec::new(),
                total_value_usd: 0.0,
                total_cost_usd: 0.0,
                pnl_usd: 0.0,
                pnl_pct: 0.0,
                valued_at: Utc::now(),
            });
        }

        let symbols: Vec<String> = portfolio.holdings.iter().map(|h| h.symbol.clone()).collect();
        let quotes = self.market.quotes(&symbols).await?;
        let prices: HashMap<&str, f64> = quotes
            .iter()
            .map(|q| (q.symbol.as_str(), q.price_usd))
            .collect();

        let mut positions = Vec::with_capacity(portfolio.holdings.len());
        for holding in &portfolio.holdings {
            let price = prices.get(holding.symbol.as_str()).copied().ok_or_else(|| {
                Error::Internal(format!("no price resolved for {}", holding.symbol))
            })?;
            let value = holding.quantity * price;
            let pnl = value - holding.cost_basis_usd;
            positions.push(PositionValuation {
                symbol: holding.symbol.clone(),
                quantity: holding.quantity,
                price_usd: price,
                value_usd: round2(value),
                cost_basis_usd: holding.cost_basis_usd,
                pnl_usd: round2(pnl),
                pnl_pct: round2(percent(pnl, holding.cost_basis_usd)),
                allocation_pct: 0.0,
            });
        }

        let total_value: f64 = positions.iter().map(|p| p.quantity * p.price_usd).sum();
        let total_cost: f64 = portfolio.holdings.iter().map(|h| h.cost_basis_usd).sum();
        for position in &mut positions {
            position.allocation_pct =
                round2(percent(position.quantity * position.price_usd, total_value));
        }

        Ok(PortfolioValuation {
            portfolio_id: portfolio.id,
            positions,
            total_value_usd: round2(total_value),
            total_cost_usd: round2(total_cost),
            pnl_usd: round2(total_value - total_cost),
            pnl_pct: round2(percent(total_value - total_cost, total_cost)),
            valued_at: Utc::now(),
        })
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl std::fmt::Debug for PortfolioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioService")
            .field("portfolios", &"<RwLock<HashMap>>")
            .field("market", &self.market)
            .finish()
    }
}
