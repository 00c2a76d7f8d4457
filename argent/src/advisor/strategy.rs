use crate::domain::normalize_symbol;
use crate::domain::strategy::{Allocation, DcaInstalment, RiskProfile, StrategySuggestion};
use crate::planes::data::MarketService;
use crate::planes::data::market::MAX_BATCH_SYMBOLS;
use chrono::Utc;
use shared::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const MAX_AMOUNT_USD: f64 = 1_000_000_000.0;
const MAX_HORIZON_MONTHS: u32 = 120;
const MAX_DCA_INSTALMENTS: u32 = 12;
const MAX_MOMENTUM_NUDGE_PCT: f64 = 5.0;

#[derive(Clone, Debug)]
pub struct StrategyRequest {
    pub risk_profile: RiskProfile,
    pub amount_usd: f64,
    pub horizon_months: u32,
    pub symbols: Option<Vec<String>>,
}

/// Rule-based allocation suggestions nudged by recent market momentum
#[derive(Clone)]
pub struct StrategyAdvisor {
    market: Arc<MarketService>,
}

impl StrategyAdvisor {
    pub fn new(market: Arc<MarketService>) -> Self {
        Self { market }
    }

    pub async fn suggest(&self, request: StrategyRequest) -> Result<StrategySuggestion> {
        validate(&request)?;
        let profile = request.risk_profile;

        let base = match &request.symbols {
            Some(symbols) if !symbols.is_empty() => custom_weights(symbols, profile)?,
            _ => base_weights(profile),
        };
        let symbols: Vec<String> = base.iter().map(|(s, _)| s.clone()).collect();

        let mut rationale = vec![format!(
            "{} profile caps any single asset at {}% of the plan",
            profile_label(profile),
            profile.max_position_pct()
        )];
        let mut confidence = match profile {
            RiskProfile::Conservative => 0.8,
            RiskProfile::Moderate => 0.7,
            RiskProfile::Aggressive => 0.6,
        };

        let weights = match self.market.quotes(&symbols).await {
            Ok(quotes) => {
                let momentum: HashMap<&str, f64> = quotes
                    .iter()
                    .map(|q| (q.symbol.as_str(), q.change_24h_pct))
                    .collect();
                let nudged: Vec<(String, f64)> = base
                    .iter()
                    .map(|(symbol, weight)| {
                        let change = momentum.get(symbol.as_str()).copied().unwrap_or(0.0);
                        let nudge =
                            (change / 2.0).clamp(-MAX_MOMENTUM_NUDGE_PCT, MAX_MOMENTUM_NUDGE_PCT);
                        (symbol.clone(), (weight + nudge).max(1.0))
                    })
                    .collect();
                rationale.push(
                    "Weights nudged by 24h momentum (at most 5 percentage points per asset)".into(),
                );
                nudged
            }
            Err(e @ (Error::Provider(_) | Error::AllProvidersFailed { .. })) => {
                warn!("Strategy falling back to static weights: {}", e);
                rationale.push("Live market data unavailable; using static weights".into());
                confidence -= 0.15;
                base
            }
            Err(e) => return Err(e),
        };
        let weights = cap_and_normalize(weights, profile.max_position_pct());

        let allocations: Vec<Allocation> = weights
            .into_iter()
            .map(|(symbol, weight)| Allocation {
                amount_usd: round2(request.amount_usd * weight / 100.0),
                weight_pct: round2(weight),
                symbol,
            })
            .collect();

        let dca_schedule = dca_schedule(request.amount_usd, request.horizon_months);
        rationale.push(format!(
            "Dollar-cost average over {} monthly instalment(s) to reduce timing risk",
            dca_schedule.len()
        ));
        if request.horizon_months < 12 && profile == RiskProfile::Aggressive {
            rationale
                .push("Short horizon with an aggressive profile increases drawdown risk".into());
            confidence -= 0.1;
        }

        Ok(StrategySuggestion {
            id: uuid::Uuid::new_v4().to_string(),
            risk_profile: profile,
            amount_usd: request.amount_usd,
            horizon_months: request.horizon_months,
            allocations,
            dca_schedule,
            rationale,
            confidence: round2(confidence),
            generated_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for StrategyAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyAdvisor").finish_non_exhaustive()
    }
}

fn validate(request: &StrategyRequest) -> Result<()> {
    if !request.amount_usd.is_finite()
        || request.amount_usd <= 0.0
        || request.amount_usd > MAX_AMOUNT_USD
    {
        return Err(Error::InvalidInput(format!(
            "amount_usd must be between 0 and {MAX_AMOUNT_USD}"
        )));
    }
    if request.horizon_months == 0 || request.horizon_months > MAX_HORIZON_MONTHS {
        return Err(Error::InvalidInput(format!(
            "horizon_months must be between 1 and {MAX_HORIZON_MONTHS}"
        )));
    }
    Ok(())
}

fn profile_label(profile: RiskProfile) -> &'static str {
    match profile {
        RiskProfile::Conservative => "Conservative",
        RiskProfile::Moderate => "Moderate",
        RiskProfile::Aggressive => "Aggressive",
    }
}

fn base_weights(profile: RiskProfile) -> Vec<(String, f64)> {
    let table: &[(&str, f64)] = match profile {
        RiskProfile::Conservative => &[
            ("BTC", 40.0),
            ("ETH", 30.0),
            ("BNB", 10.0),
            ("SOL", 10.0),
            ("ADA", 10.0),
        ],
        RiskProfile::Moderate => &[
            ("BTC", 30.0),
            ("ETH", 25.0),
            ("SOL", 15.0),
            ("BNB", 10.0),
            ("ADA", 10.0),
            ("DOT", 10.0),
        ],
        RiskProfile::Aggressive => &[
            ("BTC", 20.0),
            ("ETH", 20.0),
            ("SOL", 20.0),
            ("AVAX", 15.0),
            ("LINK", 15.0),
            ("DOGE", 10.0),
        ],
    };
    table.iter().map(|(s, w)| (s.to_string(), *w)).collect()
}

/// Equal weights over caller-chosen symbols
fn custom_weights(symbols: &[String], profile: RiskProfile) -> Result<Vec<(String, f64)>> {
    let mut unique: Vec<String> = Vec::new();
    for raw in symbols {
        let symbol = normalize_symbol(raw)?;
        if !unique.contains(&symbol) {
            unique.push(symbol);
        }
    }

    if unique.len() > MAX_BATCH_SYMBOLS {
        return Err(Error::InvalidInput(format!(
            "at most {MAX_BATCH_SYMBOLS} distinct symbols per strategy"
        )));
    }

    let cap = profile.max_position_pct();
    let required = (100.0 / cap).ceil() as usize;
    if unique.len() < required {
        return Err(Error::InvalidInput(format!(
            "{} profile needs at least {} distinct symbols",
            profile_label(profile),
            required
        )));
    }

    let weight = 100.0 / unique.len() as f64;
    Ok(unique.into_iter().map(|s| (s, weight)).collect())
}

/// Scale weights to sum to 100 while keeping each at or below `cap`;
/// excess above the cap is redistributed over the uncapped assets
fn cap_and_normalize(weights: Vec<(String, f64)>, cap: f64) -> Vec<(String, f64)> {
    let mut weights = weights;
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return weights;
    }
    for (_, w) in &mut weights {
        *w = *w / total * 100.0;
    }

    for _ in 0..weights.len() {
        let excess: f64 = weights.iter().map(|(_, w)| (w - cap).max(0.0)).sum();
        if excess < 1e-9 {
            break;
        }
        let uncapped: f64 = weights.iter().map(|(_, w)| *w).filter(|w| *w < cap).sum();
        if uncapped <= 0.0 {
            break;
        }
        for (_, w) in &mut weights {
            if *w >= cap {
                *w = cap;
            } else {
                *w += excess * (*w / uncapped);
            }
        }
    }
    weights
}

fn dca_schedule(amount: f64, horizon_months: u32) -> Vec<DcaInstalment> {
    let count = horizon_months.clamp(1, MAX_DCA_INSTALMENTS);
    let per = (amount / count as f64 * 100.0).floor() / 100.0;
    let last = round2(amount - per * (count - 1) as f64);

    (1..=count)
        .map(|month| DcaInstalment {
            month,
            amount_usd: if month == count { last } else { per },
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
