//! # PriceWatch SDK
//!
//! A Rust client for the stock/crypto price-alert platform: REST access to
//! auth, alerts, and market data, plus the live push-feed relay that powers
//! watchlist views.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Shared newtypes, domain models, unified error types
//! 2. **Auth** — Session lifecycle + durable token storage
//! 3. **HTTP API** — `PriceWatchHttp` with per-endpoint retry policies
//! 4. **WebSocket** — The push-feed relay: one live connection, symbol
//!    subscriptions, fixed-delay reconnection gated on the session
//! 5. **High-Level Client** — `PriceWatchClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pricewatch_sdk::prelude::*;
//!
//! let client = PriceWatchClient::builder()
//!     .base_url("https://alerts.example.com")
//!     .build()?;
//!
//! let session = client.auth().login("me@example.com", "hunter2!A").await?;
//!
//! let mut relay = client.ws().await?;
//! relay.connect().await?;
//!
//! let mut watchlist = Watchlist::with_defaults();
//! watchlist.refresh(&client.markets()).await?;
//! watchlist.mount(&relay);
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: sessions, durable tokens, login/logout.
pub mod auth;

// ── Layer 3: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// WebSocket layer: wire protocol, events, the push-feed relay.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `PriceWatchClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{AssetType, Symbol};

    // Domain types — alerts
    pub use crate::domain::alert::wire::{
        AlertCreateRequest, AlertListQuery, AlertStatsResponse, AlertUpdateRequest,
    };
    pub use crate::domain::alert::{Alert, AlertStatus, AlertType};

    // Domain types — market data
    pub use crate::domain::market::wire::{BatchPricesResponse, PriceData, SymbolValidation};

    // Domain types — watchlist
    pub use crate::domain::watchlist::{Watchlist, WatchlistEntry};

    // Errors
    pub use crate::error::{AuthError, HttpError, SdkError, WsError};

    // Network
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};

    // Auth + session types
    pub use crate::auth::store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};
    pub use crate::auth::{RegisterRequest, Session, SessionGate, UserProfile};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        AlertPage, AlertsClient, AuthClient, MarketsClient, PriceWatchClient,
        PriceWatchClientBuilder,
    };
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // WebSocket types
    pub use crate::ws::{
        ConnectionState, Kind, MessageOut, PriceUpdate, WsConfig, WsEvent,
    };
    #[cfg(feature = "ws-native")]
    pub use crate::ws::relay::WsClient;
}
