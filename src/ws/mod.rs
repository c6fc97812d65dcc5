//! WebSocket layer — wire protocol, events, relay configuration.
//!
//! The push feed speaks JSON objects discriminated by a `type` field in both
//! directions. Inbound frames decode into the closed [`Kind`] enum; tags the
//! client does not recognize land in the `Unknown` arm and must never crash
//! the consumer. The transport itself lives in [`relay`] (`ws-native`).

#[cfg(feature = "ws-native")]
pub mod relay;

use crate::domain::alert::AlertType;
use crate::shared::{AssetType, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum MessageOut {
    #[serde(rename = "subscribe")]
    Subscribe { symbol: Symbol },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { symbol: Symbol },
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "get_subscriptions")]
    GetSubscriptions,
}

impl MessageOut {
    pub fn subscribe(symbol: impl Into<Symbol>) -> Self {
        Self::Subscribe {
            symbol: symbol.into(),
        }
    }

    pub fn unsubscribe(symbol: impl Into<Symbol>) -> Self {
        Self::Unsubscribe {
            symbol: symbol.into(),
        }
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// The type of inbound WebSocket frame.
///
/// Closed set with a default arm: anything the server sends under a tag not
/// listed here decodes as `Unknown` and is logged, never surfaced as an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Kind {
    #[serde(rename = "connected")]
    Connected(WelcomePayload),
    #[serde(rename = "price_update")]
    PriceUpdate(PriceUpdatePayload),
    #[serde(rename = "alert_triggered")]
    AlertTriggered(AlertTriggeredPayload),
    #[serde(rename = "subscribed")]
    Subscribed(SubscriptionAck),
    #[serde(rename = "unsubscribed")]
    Unsubscribed(SubscriptionAck),
    #[serde(rename = "subscriptions")]
    Subscriptions(SubscriptionsPayload),
    #[serde(rename = "pong")]
    Pong(PongPayload),
    #[serde(rename = "error")]
    Error(WsErrorPayload),
    #[serde(other)]
    Unknown,
}

/// Welcome frame sent by the server right after the socket is accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct WelcomePayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceUpdatePayload {
    pub data: PriceUpdate,
}

/// A single push-feed price tick.
///
/// Only `symbol` and `price` are guaranteed; the feed has sent `change`,
/// `asset_type`, and `timestamp` in different combinations across versions.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PriceUpdate {
    pub symbol: Symbol,
    pub price: Decimal,
    #[serde(default)]
    pub change: Option<Decimal>,
    #[serde(default)]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertTriggeredPayload {
    pub data: AlertNotification,
}

/// Server-side alert trigger pushed to the owning user.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertNotification {
    pub alert_id: i64,
    pub symbol: Symbol,
    pub current_price: Decimal,
    pub target_price: Decimal,
    pub alert_type: AlertType,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub triggered_at: Option<String>,
}

/// Ack for a subscribe/unsubscribe command.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionAck {
    pub symbol: Symbol,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `get_subscriptions` — the server-side view of our set.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionsPayload {
    pub data: Vec<Symbol>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PongPayload {
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

// ─── Connection state ────────────────────────────────────────────────────────

/// Lifecycle state of the relay's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl From<u8> for ConnectionState {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// High-level events emitted by the relay to observers.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// A parsed frame from the server.
    Message(Kind),
    /// Connection established (fires again after every reconnect).
    Connected,
    /// Connection lost (a reconnect may follow).
    Disconnected { code: Option<u16>, reason: String },
    /// A deserialization or protocol error. Informational only — the
    /// connection state is driven by close events, not by these.
    Error(String),
}

/// Configuration for the relay.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Reconnect after unexpected closes, as long as the session holds.
    pub reconnect: bool,
    /// Fixed delay between a close and the next attempt. No backoff and no
    /// attempt cap — the loop runs until the governing session ends.
    pub reconnect_delay_ms: u64,
    /// Application-level keepalive ping interval.
    pub ping_interval_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            reconnect_delay_ms: 3_000,
            ping_interval_ms: 30_000,
        }
    }
}

impl WsConfig {
    /// Connection URL with the bearer token attached as a query parameter.
    pub fn connect_url(&self, token: &str) -> String {
        format!("{}?token={}", self.url, urlencoding::encode(token))
    }
}
