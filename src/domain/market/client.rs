//! Markets sub-client — prices with a short TTL cache, batch pulls.

use crate::client::PriceWatchClient;
use crate::domain::market::wire::{
    BatchPricesRequest, BatchPricesResponse, PriceData, SymbolValidation,
};
use crate::error::SdkError;
use crate::shared::{AssetType, Symbol};
use std::time::Instant;

/// Sub-client for market-data operations.
pub struct Markets<'a> {
    pub(crate) client: &'a PriceWatchClient,
}

impl<'a> Markets<'a> {
    /// Current price for one symbol. Uses the client's short TTL cache —
    /// upstream quotes only move every few seconds anyway.
    pub async fn price(
        &self,
        symbol: impl Into<Symbol>,
        asset_type: AssetType,
    ) -> Result<PriceData, SdkError> {
        let symbol = symbol.into();
        {
            let cache = self.client.price_cache.read().await;
            if let Some((data, fetched_at)) = cache.get(&(symbol.clone(), asset_type)) {
                if fetched_at.elapsed() < self.client.price_cache_ttl {
                    return Ok(data.clone());
                }
            }
        }

        let data = self.client.http.get_price(&symbol, asset_type).await?;
        self.client
            .price_cache
            .write()
            .await
            .insert((symbol, asset_type), (data.clone(), Instant::now()));
        Ok(data)
    }

    /// Batched pull for a whole watchlist. Never cached — this is the
    /// populate-initial-values path and callers want it fresh.
    pub async fn prices(
        &self,
        symbols: &[Symbol],
        asset_type: AssetType,
    ) -> Result<BatchPricesResponse, SdkError> {
        let request = BatchPricesRequest {
            symbols: symbols.to_vec(),
            asset_type,
        };
        Ok(self.client.http.get_prices(&request).await?)
    }

    /// Check whether a symbol resolves before creating an alert on it.
    pub async fn validate(
        &self,
        symbol: impl Into<Symbol>,
        asset_type: AssetType,
    ) -> Result<SymbolValidation, SdkError> {
        let symbol = symbol.into();
        Ok(self.client.http.validate_symbol(&symbol, asset_type).await?)
    }

    /// Drop all cached prices.
    pub async fn clear_cache(&self) {
        self.client.price_cache.write().await.clear();
    }
}
