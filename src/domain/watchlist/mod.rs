//! Watchlist domain — the fixed set of symbols a view tracks for display.

pub mod state;

pub use state::{RefreshToken, Watchlist};

use crate::shared::{AssetType, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the live-price watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: Symbol,
    pub display_symbol: String,
    pub asset_type: AssetType,
    pub last_price: Option<Decimal>,
    pub last_change: Option<Decimal>,
}

impl WatchlistEntry {
    pub fn new(symbol: impl Into<Symbol>, asset_type: AssetType) -> Self {
        let symbol = symbol.into();
        let display_symbol = match asset_type {
            AssetType::Crypto => format!("{}/USD", symbol),
            AssetType::Stock => symbol.to_string(),
        };
        Self {
            symbol,
            display_symbol,
            asset_type,
            last_price: None,
            last_change: None,
        }
    }
}

/// The default watchlist shown before the user customizes anything.
pub fn default_entries() -> Vec<WatchlistEntry> {
    let crypto = ["BTC", "ETH", "BNB", "SOL"];
    let stocks = ["AAPL", "GOOGL", "MSFT", "TSLA"];

    crypto
        .iter()
        .map(|s| WatchlistEntry::new(*s, AssetType::Crypto))
        .chain(stocks.iter().map(|s| WatchlistEntry::new(*s, AssetType::Stock)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entries_cover_both_asset_types() {
        let entries = default_entries();
        assert_eq!(entries.len(), 8);
        assert!(entries.iter().any(|e| e.asset_type == AssetType::Crypto));
        assert!(entries.iter().any(|e| e.asset_type == AssetType::Stock));
        assert!(entries.iter().all(|e| e.last_price.is_none()));
    }

    #[test]
    fn test_display_symbol_by_asset_type() {
        assert_eq!(
            WatchlistEntry::new("btc", AssetType::Crypto).display_symbol,
            "BTC/USD"
        );
        assert_eq!(
            WatchlistEntry::new("AAPL", AssetType::Stock).display_symbol,
            "AAPL"
        );
    }
}
