/// Ticker symbol to CoinGecko coin id
const COINGECKO_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("AVAX", "avalanche-2"),
    ("DOT", "polkadot"),
    ("LINK", "chainlink"),
    ("MATIC", "matic-network"),
    ("ATOM", "cosmos"),
    ("LTC", "litecoin"),
    ("USDT", "tether"),
    ("USDC", "usd-coin"),
];

pub fn coingecko_id(symbol: &str) -> Option<&'static str> {
    COINGECKO_IDS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, id)| *id)
}

pub fn symbol_for_coingecko_id(id: &str) -> Option<&'static str> {
    COINGECKO_IDS
        .iter()
        .find(|(_, i)| *i == id)
        .map(|(s, _)| *s)
}

/// Binance spot pair quoted in USDT, e.g. `BTCUSDT`
pub fn binance_pair(symbol: &str) -> Option<String> {
    let symbol = symbol.to_uppercase();
    if symbol.is_empty() || symbol == "USDT" {
        return None;
    }
    Some(format!("{symbol}USDT"))
}

pub fn symbol_for_binance_pair(pair: &str) -> Option<&str> {
    pair.strip_suffix("USDT").filter(|s| !s.is_empty())
}
