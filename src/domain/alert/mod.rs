//! Alert domain — alert types, validation, conversion.

#[cfg(feature = "http")]
pub mod client;
mod convert;
pub mod wire;

use crate::shared::{AssetType, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── AlertType ───────────────────────────────────────────────────────────────

/// Condition an alert fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Price crosses above the target.
    Above,
    /// Price crosses below the target.
    Below,
    /// Price moves by at least `percent_change` percent from creation.
    PercentChange,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::PercentChange => "percent_change",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── AlertStatus ─────────────────────────────────────────────────────────────

/// Lifecycle status of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Triggered,
    Paused,
    Deleted,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Triggered => "triggered",
            Self::Paused => "paused",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Platform limits ─────────────────────────────────────────────────────────

/// Target price must lie strictly inside this range.
pub fn target_price_bounds() -> (Decimal, Decimal) {
    (Decimal::new(1, 2), Decimal::from(1_000_000_000_i64))
}

/// Percent-change thresholds must lie inside this range, inclusive.
pub fn percent_change_bounds() -> (Decimal, Decimal) {
    (Decimal::new(1, 1), Decimal::from(100))
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// A fully validated alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub user_id: i64,
    pub symbol: Symbol,
    pub asset_type: AssetType,
    pub alert_type: AlertType,
    pub target_price: Decimal,
    pub percent_change: Option<Decimal>,
    pub status: AlertStatus,
    pub notify_email: bool,
    pub notify_sms: bool,
    pub notify_websocket: bool,
    pub created_price: Option<Decimal>,
    pub triggered_price: Option<Decimal>,
    pub triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    pub fn is_triggered(&self) -> bool {
        self.status == AlertStatus::Triggered
    }
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum ValidationError {
    SymbolMissing,
    TargetPriceOutOfRange(Decimal),
    /// percent_change is required for `PercentChange` alerts.
    PercentChangeMissing,
    /// percent_change is only meaningful for `PercentChange` alerts.
    PercentChangeUnexpected,
    PercentChangeOutOfRange(Decimal),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SymbolMissing => write!(f, "Missing symbol"),
            ValidationError::TargetPriceOutOfRange(p) => {
                write!(f, "Target price out of range: {}", p)
            }
            ValidationError::PercentChangeMissing => {
                write!(f, "percent_change is required for percent_change alerts")
            }
            ValidationError::PercentChangeUnexpected => {
                write!(f, "percent_change is only valid for percent_change alerts")
            }
            ValidationError::PercentChangeOutOfRange(p) => {
                write!(f, "percent_change out of range: {}", p)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate the alert-condition fields shared by create requests and
/// backend rows.
pub(crate) fn validate_condition(
    symbol: &Symbol,
    alert_type: AlertType,
    target_price: Decimal,
    percent_change: Option<Decimal>,
) -> Result<(), ValidationError> {
    if symbol.as_str().is_empty() {
        return Err(ValidationError::SymbolMissing);
    }

    let (min_price, max_price) = target_price_bounds();
    if target_price <= min_price || target_price >= max_price {
        return Err(ValidationError::TargetPriceOutOfRange(target_price));
    }

    match (alert_type, percent_change) {
        (AlertType::PercentChange, None) => Err(ValidationError::PercentChangeMissing),
        (AlertType::PercentChange, Some(pc)) => {
            let (min_pc, max_pc) = percent_change_bounds();
            if pc < min_pc || pc > max_pc {
                Err(ValidationError::PercentChangeOutOfRange(pc))
            } else {
                Ok(())
            }
        }
        (_, Some(_)) => Err(ValidationError::PercentChangeUnexpected),
        (_, None) => Ok(()),
    }
}
