use crate::domain::intent::{Intent, IntentClassification};

/// Keyword table in precedence order; earlier rows win ties
const RULES: &[(Intent, &[&str])] = &[
    (
        Intent::RiskAssessment,
        &["risk", "volatil", "safe", "drawdown", "lose", "hedge", "downside"],
    ),
    (
        Intent::Trading,
        &["trade", "trading", "buy", "sell", "short", "leverage", "entry", "exit", "swing"],
    ),
    (
        Intent::Investment,
        &["invest", "dca", "allocat", "long term", "long-term", "retire", "savings", "diversif"],
    ),
    (
        Intent::PortfolioReview,
        &["portfolio", "holdings", "rebalanc", "performance", "pnl", "profit", "my balance"],
    ),
    (
        Intent::MarketInfo,
        &["price", "market", "trend", "chart", "volume", "news", "worth"],
    ),
    (
        Intent::Education,
        &["what is", "what are", "explain", "how does", "how do", "learn", "meaning of"],
    ),
];

const KNOWN_SYMBOLS: &[&str] = &[
    "BTC", "ETH", "SOL", "BNB", "XRP", "ADA", "DOGE", "AVAX", "DOT", "LINK", "MATIC", "ATOM",
    "LTC", "USDT", "USDC",
];

const ASSET_NAMES: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("ether", "ETH"),
    ("solana", "SOL"),
    ("cardano", "ADA"),
    ("ripple", "XRP"),
    ("dogecoin", "DOGE"),
    ("avalanche", "AVAX"),
    ("polkadot", "DOT"),
    ("chainlink", "LINK"),
    ("litecoin", "LTC"),
];

/// Rule-based classifier for free-text financial questions.
///
/// Every intent scores the number of distinct keywords found in the
/// lower-cased text. The highest score wins and ties go to the intent listed
/// first in `RULES`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> IntentClassification {
        let lowered = text.to_lowercase();

        let mut best: Option<(Intent, Vec<&str>)> = None;
        for (intent, keywords) in RULES {
            let matched: Vec<&str> = keywords
                .iter()
                .copied()
                .filter(|k| lowered.contains(k))
                .collect();
            if matched.is_empty() {
                continue;
            }
            let better = match &best {
                Some((_, current)) => matched.len() > current.len(),
                None => true,
            };
            if better {
                best = Some((*intent, matched));
            }
        }

        let symbols = extract_symbols(text);
        match best {
            Some((intent, matched)) => {
                let score = matched.len() as f64;
                IntentClassification {
                    intent,
                    confidence: (score / (score + 1.0) * 100.0).round() / 100.0,
                    matched_keywords: matched.into_iter().map(String::from).collect(),
                    symbols,
                }
            }
            None => IntentClassification {
                intent: Intent::Unknown,
                confidence: 0.0,
                matched_keywords: Vec::new(),
                symbols,
            },
        }
    }
}

/// Ticker symbols and well-known asset names mentioned in `text`, in order
fn extract_symbols(text: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for token in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let upper = token.to_uppercase();
        let lower = token.to_lowercase();
        let symbol = if KNOWN_SYMBOLS.contains(&upper.as_str()) {
            Some(upper)
        } else {
            ASSET_NAMES
                .iter()
                .find(|(name, _)| *name == lower)
                .map(|(_, symbol)| symbol.to_string())
        };
        if let Some(symbol) = symbol {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
    }
    symbols
}
