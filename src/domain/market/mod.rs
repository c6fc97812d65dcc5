//! Market-data domain — current prices, batch pulls, symbol validation.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use crate::shared::Symbol;

/// Cryptocurrencies the platform serves out of the box.
pub const SUPPORTED_CRYPTO: &[&str] = &[
    "BTC", "ETH", "BNB", "ADA", "SOL", "DOT", "DOGE", "XRP", "USDT", "USDC",
];

/// Stocks the platform serves out of the box.
pub const SUPPORTED_STOCKS: &[&str] = &[
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META", "NVDA", "AMD",
];

/// Whether a symbol is in the platform's built-in universe. Symbols outside
/// it may still resolve — the backend probes its upstream sources — but
/// these are guaranteed.
pub fn is_supported(symbol: &Symbol) -> bool {
    SUPPORTED_CRYPTO.contains(&symbol.as_str()) || SUPPORTED_STOCKS.contains(&symbol.as_str())
}
