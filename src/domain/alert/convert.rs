//! Conversion: AlertResponse → Alert (TryFrom + validation).

use super::wire;
use super::{validate_condition, Alert, ValidationError};

impl TryFrom<wire::AlertResponse> for Alert {
    type Error = ValidationError;

    fn try_from(source: wire::AlertResponse) -> Result<Self, Self::Error> {
        validate_condition(
            &source.symbol,
            source.alert_type,
            source.target_price,
            source.percent_change,
        )?;

        Ok(Alert {
            id: source.id,
            user_id: source.user_id,
            symbol: source.symbol,
            asset_type: source.asset_type,
            alert_type: source.alert_type,
            target_price: source.target_price,
            percent_change: source.percent_change,
            status: source.status,
            notify_email: source.notify_email,
            notify_sms: source.notify_sms,
            notify_websocket: source.notify_websocket,
            created_price: source.created_price,
            triggered_price: source.triggered_price,
            triggered_at: source.triggered_at,
            created_at: source.created_at,
            updated_at: source.updated_at,
        })
    }
}
