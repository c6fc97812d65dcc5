//! Alerts sub-client — CRUD, pagination, stats.

use crate::client::PriceWatchClient;
use crate::domain::alert::wire::{
    AlertCreateRequest, AlertListQuery, AlertStatsResponse, AlertUpdateRequest,
};
use crate::domain::alert::{self, Alert, AlertStatus};
use crate::error::SdkError;

/// One page of a user's alerts.
#[derive(Debug, Clone)]
pub struct AlertPage {
    pub alerts: Vec<Alert>,
    pub total: u64,
}

/// Sub-client for alert operations.
pub struct Alerts<'a> {
    pub(crate) client: &'a PriceWatchClient,
}

impl<'a> Alerts<'a> {
    /// List the user's alerts, optionally filtered by status/asset type.
    pub async fn list(&self, query: &AlertListQuery) -> Result<AlertPage, SdkError> {
        let resp = self.client.http.get_alerts(query).await?;

        let mut alerts = Vec::with_capacity(resp.alerts.len());
        for wire in resp.alerts {
            let alert: Alert = wire
                .try_into()
                .map_err(|e: alert::ValidationError| SdkError::Validation(e.to_string()))?;
            alerts.push(alert);
        }

        Ok(AlertPage {
            alerts,
            total: resp.total,
        })
    }

    /// Create an alert. The condition is validated locally before the
    /// request is sent, mirroring the backend's own rules.
    pub async fn create(&self, request: &AlertCreateRequest) -> Result<Alert, SdkError> {
        alert::validate_condition(
            &request.symbol,
            request.alert_type,
            request.target_price,
            request.percent_change,
        )
        .map_err(|e| SdkError::Validation(e.to_string()))?;

        let resp = self.client.http.create_alert(request).await?;
        resp.try_into()
            .map_err(|e: alert::ValidationError| SdkError::Validation(e.to_string()))
    }

    /// Partially update an alert.
    pub async fn update(
        &self,
        alert_id: i64,
        request: &AlertUpdateRequest,
    ) -> Result<Alert, SdkError> {
        let resp = self.client.http.update_alert(alert_id, request).await?;
        resp.try_into()
            .map_err(|e: alert::ValidationError| SdkError::Validation(e.to_string()))
    }

    /// Delete an alert.
    pub async fn delete(&self, alert_id: i64) -> Result<(), SdkError> {
        self.client.http.delete_alert(alert_id).await?;
        Ok(())
    }

    /// Pause an active alert.
    pub async fn pause(&self, alert_id: i64) -> Result<Alert, SdkError> {
        self.update(
            alert_id,
            &AlertUpdateRequest {
                status: Some(AlertStatus::Paused),
                ..Default::default()
            },
        )
        .await
    }

    /// Resume a paused alert.
    pub async fn resume(&self, alert_id: i64) -> Result<Alert, SdkError> {
        self.update(
            alert_id,
            &AlertUpdateRequest {
                status: Some(AlertStatus::Active),
                ..Default::default()
            },
        )
        .await
    }

    /// The user's alert counters.
    pub async fn stats(&self) -> Result<AlertStatsResponse, SdkError> {
        Ok(self.client.http.get_alert_stats().await?)
    }
}
