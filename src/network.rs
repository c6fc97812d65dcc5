//! Network URL constants for the PriceWatch SDK.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default WebSocket URL (token appended as a query parameter on connect).
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/api/v1/ws/connect";

/// REST path prefix shared by every endpoint.
pub const API_PREFIX: &str = "/api/v1";
