//! High-level client — `PriceWatchClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, shared session state, and accessor methods.

use crate::auth::client::Auth;
use crate::auth::store::{FileTokenStore, TokenStore};
use crate::auth::Session;
use crate::domain::alert::client::Alerts;
use crate::domain::market::client::Markets;
use crate::domain::market::wire::PriceData;
use crate::error::SdkError;
use crate::http::PriceWatchHttp;
use crate::shared::{AssetType, Symbol};
use crate::ws::WsConfig;

use async_lock::RwLock;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::alert::client::{AlertPage, Alerts as AlertsClient};
pub use crate::domain::market::client::Markets as MarketsClient;

/// The primary entry point for the PriceWatch SDK.
///
/// Provides nested sub-client accessors for each domain:
/// `client.auth()`, `client.alerts()`, `client.markets()`.
pub struct PriceWatchClient {
    pub(crate) http: PriceWatchHttp,
    pub(crate) ws_config: WsConfig,
    /// Current session. Written only by the auth sub-client.
    pub(crate) session: Arc<RwLock<Option<Session>>>,
    /// Bumped on login/logout/failed resolution; relays gate on it.
    pub(crate) session_generation: Arc<AtomicU64>,
    /// Durable home of the bearer token pair.
    pub(crate) token_store: Arc<dyn TokenStore>,
    /// Price cache: (symbol, asset type) → (data, fetched_at)
    pub(crate) price_cache: Arc<RwLock<HashMap<(Symbol, AssetType), (PriceData, Instant)>>>,
    /// Cache TTL for prices — short, quotes go stale fast.
    pub(crate) price_cache_ttl: Duration,
}

impl PriceWatchClient {
    pub fn builder() -> PriceWatchClientBuilder {
        PriceWatchClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn alerts(&self) -> Alerts<'_> {
        Alerts { client: self }
    }

    pub fn markets(&self) -> Markets<'_> {
        Markets { client: self }
    }

    /// Get the WS config used for new relays.
    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// Create a new relay for the current session.
    ///
    /// The relay is intentionally not embedded in `PriceWatchClient` because
    /// its lifetime is managed at the application layer (tied to a view's
    /// lifecycle). It carries the current access token and a gate pinned to
    /// the current session generation, so it dies with the session.
    #[cfg(feature = "ws-native")]
    pub async fn ws(&self) -> Result<crate::ws::relay::WsClient, SdkError> {
        use crate::auth::SessionGate;
        use crate::error::AuthError;

        if self.session.read().await.is_none() {
            return Err(AuthError::NotAuthenticated.into());
        }
        let token = self
            .http
            .auth_token()
            .await
            .ok_or(AuthError::NotAuthenticated)?;

        let gate = SessionGate::observe(&self.session_generation);
        Ok(crate::ws::relay::WsClient::new(
            self.ws_config.clone(),
            gate,
            &token,
        ))
    }

    /// Clear all HTTP caches.
    pub async fn clear_all_caches(&self) {
        self.price_cache.write().await.clear();
    }
}

impl Clone for PriceWatchClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            ws_config: self.ws_config.clone(),
            session: self.session.clone(),
            session_generation: self.session_generation.clone(),
            token_store: self.token_store.clone(),
            price_cache: self.price_cache.clone(),
            price_cache_ttl: self.price_cache_ttl,
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct PriceWatchClientBuilder {
    base_url: String,
    ws_url: String,
    price_cache_ttl: Duration,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl Default for PriceWatchClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            ws_url: crate::network::DEFAULT_WS_URL.to_string(),
            price_cache_ttl: Duration::from_secs(5),
            token_store: None,
        }
    }
}

impl PriceWatchClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    pub fn price_cache_ttl(mut self, ttl: Duration) -> Self {
        self.price_cache_ttl = ttl;
        self
    }

    /// Use a specific token store (the default is a `FileTokenStore` at the
    /// platform's standard path).
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn build(self) -> Result<PriceWatchClient, SdkError> {
        Ok(PriceWatchClient {
            http: PriceWatchHttp::new(&self.base_url),
            ws_config: WsConfig {
                url: self.ws_url,
                ..WsConfig::default()
            },
            session: Arc::new(RwLock::new(None)),
            session_generation: Arc::new(AtomicU64::new(0)),
            token_store: self
                .token_store
                .unwrap_or_else(|| Arc::new(FileTokenStore::default())),
            price_cache: Arc::new(RwLock::new(HashMap::new())),
            price_cache_ttl: self.price_cache_ttl,
        })
    }
}
