//! Watchlist state container — app-owned, SDK-provided update logic.

use crate::domain::watchlist::{default_entries, WatchlistEntry};
use crate::shared::{AssetType, Symbol};
use crate::ws::PriceUpdate;

#[cfg(feature = "ws-native")]
use crate::ws::relay::WsClient;

/// Live watchlist state for one view.
///
/// The app owns an instance per mounted view. Price events fold into it
/// last-write-wins; symbols it does not track are ignored. The epoch guards
/// against in-flight pull responses landing after the view went away.
#[derive(Debug, Clone)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
    epoch: u64,
    mounted: bool,
}

/// Capability to apply one refresh result. Taken before the pull request is
/// issued; dead as soon as the watchlist unmounts.
#[derive(Debug, Clone, Copy)]
pub struct RefreshToken {
    epoch: u64,
}

impl Watchlist {
    pub fn new(entries: Vec<WatchlistEntry>) -> Self {
        Self {
            entries,
            epoch: 0,
            mounted: false,
        }
    }

    /// The fixed default list.
    pub fn with_defaults() -> Self {
        Self::new(default_entries())
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|e| &e.symbol == symbol)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Tracked symbols of one asset class, for batched pulls.
    pub fn symbols(&self, asset_type: AssetType) -> Vec<Symbol> {
        self.entries
            .iter()
            .filter(|e| e.asset_type == asset_type)
            .map(|e| e.symbol.clone())
            .collect()
    }

    /// Subscribe every entry on the relay and mark the view mounted.
    ///
    /// Fire-and-forget: a relay that is not running drops the requests (they
    /// are logged, not propagated) — the relay replays tracked subscriptions
    /// itself once it connects.
    #[cfg(feature = "ws-native")]
    pub fn mount(&mut self, relay: &WsClient) {
        for entry in &self.entries {
            if let Err(e) = relay.subscribe(entry.symbol.clone()) {
                tracing::debug!("Watchlist subscribe {} dropped: {}", entry.symbol, e);
            }
        }
        self.mounted = true;
    }

    /// Unsubscribe every entry and invalidate in-flight refreshes.
    #[cfg(feature = "ws-native")]
    pub fn unmount(&mut self, relay: &WsClient) {
        for entry in &self.entries {
            if let Err(e) = relay.unsubscribe(entry.symbol.clone()) {
                tracing::debug!("Watchlist unsubscribe {} dropped: {}", entry.symbol, e);
            }
        }
        self.invalidate();
    }

    /// Invalidate without a relay — unmount's state half.
    pub fn invalidate(&mut self) {
        self.mounted = false;
        self.epoch += 1;
    }

    /// Fold one price event into the matching entry. Last write wins;
    /// events for untracked symbols return `false` and change nothing.
    pub fn apply(&mut self, update: &PriceUpdate) -> bool {
        match self.entries.iter_mut().find(|e| e.symbol == update.symbol) {
            Some(entry) => {
                entry.last_price = Some(update.price);
                if update.change.is_some() {
                    entry.last_change = update.change;
                }
                true
            }
            None => false,
        }
    }

    /// Begin a pull refresh: capture the current epoch.
    pub fn begin_refresh(&self) -> RefreshToken {
        RefreshToken { epoch: self.epoch }
    }

    /// Apply a batched pull result, unless the view has unmounted since the
    /// token was taken. Returns whether anything was applied.
    pub fn apply_refresh(
        &mut self,
        token: RefreshToken,
        prices: &crate::domain::market::wire::BatchPricesResponse,
    ) -> bool {
        if token.epoch != self.epoch {
            tracing::debug!("Dropping stale refresh result (view unmounted)");
            return false;
        }

        let mut applied = false;
        for entry in &mut self.entries {
            if let Some(data) = prices.prices.get(&entry.symbol) {
                entry.last_price = Some(data.price);
                applied = true;
            }
        }
        applied
    }

    /// One-shot pull of current prices for every entry, independent of the
    /// subscription path. Populates initial values before push events arrive.
    #[cfg(feature = "http")]
    pub async fn refresh(
        &mut self,
        markets: &crate::domain::market::client::Markets<'_>,
    ) -> Result<(), crate::error::SdkError> {
        let token = self.begin_refresh();

        for asset_type in [AssetType::Crypto, AssetType::Stock] {
            let symbols = self.symbols(asset_type);
            if symbols.is_empty() {
                continue;
            }
            let batch = markets.prices(&symbols, asset_type).await?;
            for (symbol, reason) in &batch.errors {
                tracing::warn!("No price for {}: {}", symbol, reason);
            }
            self.apply_refresh(token, &batch);
        }

        Ok(())
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::with_defaults()
    }
}
