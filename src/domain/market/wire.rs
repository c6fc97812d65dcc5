//! Wire types for market-data responses.

use crate::shared::serde_util::flexible_utc;
use crate::shared::{AssetType, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current price for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceData {
    pub symbol: Symbol,
    pub asset_type: AssetType,
    pub price: Decimal,
    #[serde(deserialize_with = "flexible_utc::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Upstream the backend resolved this from ("binance", "yahoo", ...).
    pub source: String,
}

/// Request body for `POST /api/v1/market/prices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPricesRequest {
    pub symbols: Vec<Symbol>,
    pub asset_type: AssetType,
}

/// Batched price response. Symbols the backend could not resolve appear in
/// `errors` instead of `prices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPricesResponse {
    pub prices: HashMap<Symbol, PriceData>,
    #[serde(default)]
    pub errors: HashMap<Symbol, String>,
}

/// Response for `GET /api/v1/market/validate/{symbol}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolValidation {
    pub symbol: Symbol,
    pub asset_type: AssetType,
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_data_decodes_naive_timestamp() {
        // The market-data service emits naive UTC timestamps.
        let data: PriceData = serde_json::from_str(
            r#"{"symbol":"BTC","asset_type":"crypto","price":50000.5,
                "timestamp":"2026-08-07T12:00:00.123456","source":"binance"}"#,
        )
        .unwrap();
        assert_eq!(data.symbol, Symbol::from("BTC"));
        assert_eq!(data.source, "binance");
    }

    #[test]
    fn test_batch_response_decodes_partial_failure() {
        let resp: BatchPricesResponse = serde_json::from_str(
            r#"{"prices":{"BTC":{"symbol":"BTC","asset_type":"crypto","price":50000,
                "timestamp":"2026-08-07T12:00:00","source":"binance"}},
                "errors":{"NOPE":"Symbol not found"}}"#,
        )
        .unwrap();
        assert_eq!(resp.prices.len(), 1);
        assert_eq!(resp.errors.get(&Symbol::from("NOPE")).unwrap(), "Symbol not found");
    }
}
