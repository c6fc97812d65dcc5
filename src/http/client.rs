//! Low-level HTTP client — `PriceWatchHttp`.
//!
//! One method per API endpoint. Returns wire types (conversion to domain
//! types happens at the sub-client boundary). Internal to the SDK — the
//! high-level client wraps this.

use crate::auth::{
    LoginRequest, MessageResponse, RefreshRequest, RegisterRequest, TokenResponse, UserProfile,
};
use crate::domain::alert::wire::{
    AlertCreateRequest, AlertListQuery, AlertListResponse, AlertResponse, AlertStatsResponse,
    AlertUpdateRequest,
};
use crate::domain::market::wire::{
    BatchPricesRequest, BatchPricesResponse, PriceData, SymbolValidation,
};
use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::network::API_PREFIX;
use crate::shared::{AssetType, Symbol};

use async_lock::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Low-level HTTP client for the alert platform's REST API.
pub struct PriceWatchHttp {
    base_url: String,
    client: Client,
    /// Bearer token for the current session. NEVER exposed publicly.
    auth_token: Arc<RwLock<Option<String>>>,
}

impl PriceWatchHttp {
    pub fn new(base_url: &str) -> Self {
        let builder = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build().expect("Failed to build HTTP client"),
            auth_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Install the bearer token injected into every request.
    pub(crate) async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    /// Clear the bearer token.
    pub(crate) async fn clear_auth_token(&self) {
        *self.auth_token.write().await = None;
    }

    /// Current bearer token, for the relay's connect URL. Crate-internal.
    pub(crate) async fn auth_token(&self) -> Option<String> {
        self.auth_token.read().await.clone()
    }

    // ── Auth ─────────────────────────────────────────────────────────────

    pub async fn register(&self, body: &RegisterRequest) -> Result<UserProfile, HttpError> {
        let url = self.api_url("/auth/register");
        self.post(&url, body, RetryPolicy::None).await
    }

    pub async fn login(&self, body: &LoginRequest) -> Result<TokenResponse, HttpError> {
        let url = self.api_url("/auth/login");
        self.post(&url, body, RetryPolicy::None).await
    }

    pub async fn refresh(&self, body: &RefreshRequest) -> Result<TokenResponse, HttpError> {
        let url = self.api_url("/auth/refresh");
        self.post(&url, body, RetryPolicy::None).await
    }

    pub async fn logout(&self) -> Result<MessageResponse, HttpError> {
        let url = self.api_url("/auth/logout");
        self.post(&url, &serde_json::json!({}), RetryPolicy::None)
            .await
    }

    pub async fn me(&self) -> Result<UserProfile, HttpError> {
        let url = self.api_url("/auth/me");
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Alerts ───────────────────────────────────────────────────────────

    pub async fn get_alerts(&self, query: &AlertListQuery) -> Result<AlertListResponse, HttpError> {
        let mut url = self.api_url("/alerts");
        let params = query.to_query_pairs();
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }
        self.get(&url, RetryPolicy::Idempotent).await
    }

    pub async fn create_alert(
        &self,
        body: &AlertCreateRequest,
    ) -> Result<AlertResponse, HttpError> {
        let url = self.api_url("/alerts");
        self.post(&url, body, RetryPolicy::None).await
    }

    pub async fn update_alert(
        &self,
        alert_id: i64,
        body: &AlertUpdateRequest,
    ) -> Result<AlertResponse, HttpError> {
        let url = self.api_url(&format!("/alerts/{}", alert_id));
        self.put(&url, body, RetryPolicy::None).await
    }

    pub async fn delete_alert(&self, alert_id: i64) -> Result<MessageResponse, HttpError> {
        let url = self.api_url(&format!("/alerts/{}", alert_id));
        self.delete(&url, RetryPolicy::None).await
    }

    pub async fn get_alert_stats(&self) -> Result<AlertStatsResponse, HttpError> {
        let url = self.api_url("/alerts/stats");
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Market data ──────────────────────────────────────────────────────

    pub async fn get_price(
        &self,
        symbol: &Symbol,
        asset_type: AssetType,
    ) -> Result<PriceData, HttpError> {
        let url = format!(
            "{}?asset_type={}",
            self.api_url(&format!(
                "/market/price/{}",
                urlencoding::encode(symbol.as_str())
            )),
            asset_type.as_str()
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    /// Batched pull — a read in POST clothing, so it retries as idempotent.
    pub async fn get_prices(
        &self,
        body: &BatchPricesRequest,
    ) -> Result<BatchPricesResponse, HttpError> {
        let url = self.api_url("/market/prices");
        self.post(&url, body, RetryPolicy::Idempotent).await
    }

    pub async fn validate_symbol(
        &self,
        symbol: &Symbol,
        asset_type: AssetType,
    ) -> Result<SymbolValidation, HttpError> {
        let url = format!(
            "{}?asset_type={}",
            self.api_url(&format!(
                "/market/validate/{}",
                urlencoding::encode(symbol.as_str())
            )),
            asset_type.as_str()
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str, retry: RetryPolicy) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, retry)
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::POST, url, Some(body), retry)
            .await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::PUT, url, Some(body), retry)
            .await
    }

    async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::DELETE, url, None::<&()>, retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let config = match &retry {
            RetryPolicy::None => {
                return self.do_request(&method, url, body).await;
            }
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T, B>(&method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::ServerError { status, .. } => {
                            config.retryable_statuses.contains(status)
                        }
                        HttpError::RateLimited { retry_after_ms } => {
                            if let Some(ms) = retry_after_ms {
                                futures_timer::Delay::new(Duration::from_millis(*ms)).await;
                            }
                            true
                        }
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            re.is_connect() || re.is_timeout() || re.is_request()
                        }
                        _ => false,
                    };

                    if should_retry && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);

        if let Some(token) = self.auth_token.read().await.as_ref() {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            401 => Err(HttpError::Unauthorized),
            404 => Err(HttpError::NotFound(body_text)),
            429 => Err(HttpError::RateLimited {
                retry_after_ms: None,
            }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

impl Clone for PriceWatchHttp {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let http = PriceWatchHttp::new("http://example.test/");
        assert_eq!(http.base_url(), "http://example.test");
        assert_eq!(
            http.api_url("/auth/login"),
            "http://example.test/api/v1/auth/login"
        );
    }
}
