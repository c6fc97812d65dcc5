//! Wire types for alert endpoints.

use crate::domain::alert::{AlertStatus, AlertType};
use crate::shared::serde_util::flexible_utc;
use crate::shared::{AssetType, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// REST response for a single alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertResponse {
    pub id: i64,
    pub user_id: i64,
    pub symbol: Symbol,
    pub asset_type: AssetType,
    pub alert_type: AlertType,
    pub target_price: Decimal,
    #[serde(default)]
    pub percent_change: Option<Decimal>,
    pub status: AlertStatus,
    pub notify_email: bool,
    pub notify_sms: bool,
    #[serde(default = "default_true")]
    pub notify_websocket: bool,
    #[serde(default)]
    pub created_price: Option<Decimal>,
    #[serde(default)]
    pub triggered_price: Option<Decimal>,
    #[serde(default, deserialize_with = "flexible_utc::option::deserialize")]
    pub triggered_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "flexible_utc::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "flexible_utc::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Paginated alert list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertListResponse {
    pub total: u64,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    pub alerts: Vec<AlertResponse>,
}

/// Request body for `POST /api/v1/alerts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertCreateRequest {
    pub symbol: Symbol,
    pub asset_type: AssetType,
    pub alert_type: AlertType,
    pub target_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<Decimal>,
    pub notify_email: bool,
    pub notify_sms: bool,
    pub notify_websocket: bool,
}

impl AlertCreateRequest {
    /// New request with the platform's default notification channels
    /// (email + websocket on, SMS off).
    pub fn new(
        symbol: impl Into<Symbol>,
        asset_type: AssetType,
        alert_type: AlertType,
        target_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            asset_type,
            alert_type,
            target_price,
            percent_change: None,
            notify_email: true,
            notify_sms: false,
            notify_websocket: true,
        }
    }

    pub fn percent_change(mut self, pc: Decimal) -> Self {
        self.percent_change = Some(pc);
        self
    }

    pub fn notify_sms(mut self, enabled: bool) -> Self {
        self.notify_sms = enabled;
        self
    }

    pub fn notify_email(mut self, enabled: bool) -> Self {
        self.notify_email = enabled;
        self
    }
}

/// Request body for `PUT /api/v1/alerts/{id}` — partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_sms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_websocket: Option<bool>,
}

/// Per-user alert statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertStatsResponse {
    pub total_alerts: u64,
    pub active_alerts: u64,
    pub triggered_alerts: u64,
    pub paused_alerts: u64,
}

/// Query parameters for `GET /api/v1/alerts`.
#[derive(Debug, Clone, Default)]
pub struct AlertListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<AlertStatus>,
    pub asset_type: Option<AssetType>,
}

impl AlertListQuery {
    pub fn to_query_pairs(&self) -> Vec<String> {
        let mut params = Vec::new();
        if let Some(p) = self.page {
            params.push(format!("page={}", p));
        }
        if let Some(s) = self.page_size {
            params.push(format!("page_size={}", s));
        }
        if let Some(status) = self.status {
            params.push(format!("status={}", status.as_str()));
        }
        if let Some(at) = self.asset_type {
            params.push(format!("asset_type={}", at.as_str()));
        }
        params
    }
}
