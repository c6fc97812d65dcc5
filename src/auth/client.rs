//! Auth sub-client — register, login, logout, session resolution, refresh.

use std::sync::atomic::Ordering;

use crate::auth::store::StoredTokens;
use crate::auth::{
    LoginRequest, RefreshRequest, RegisterRequest, Session, SessionGate, UserProfile,
};
use crate::client::PriceWatchClient;
use crate::error::{AuthError, HttpError, SdkError};

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a PriceWatchClient,
}

impl<'a> Auth<'a> {
    /// Register a new account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, SdkError> {
        Ok(self.client.http.register(request).await?)
    }

    /// Exchange credentials for a token pair and establish a session.
    ///
    /// Persists both tokens, installs the access token on the HTTP layer,
    /// and resolves the user profile. On any failure no session is
    /// established and the HTTP layer is left without a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SdkError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let tokens = match self.client.http.login(&request).await {
            Ok(tokens) => tokens,
            Err(HttpError::Unauthorized) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e.into()),
        };

        self.client
            .http
            .set_auth_token(Some(tokens.access_token.clone()))
            .await;

        let profile = match self.client.http.me().await {
            Ok(profile) => profile,
            Err(e) => {
                self.client.http.clear_auth_token().await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.client.token_store.save(&StoredTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }) {
            tracing::warn!("Failed to persist tokens: {}", e);
        }

        let session = Session::from(profile);
        *self.client.session.write().await = Some(session.clone());
        self.client.session_generation.fetch_add(1, Ordering::SeqCst);

        tracing::info!(user_id = session.user_id, "Logged in");
        Ok(session)
    }

    /// End the session.
    ///
    /// Notifies the backend best-effort (failure is logged, not propagated),
    /// then unconditionally clears the in-memory session, the HTTP bearer
    /// token, and the durable token pair. Bumping the generation is what
    /// stops any relay tied to this session from reconnecting.
    pub async fn logout(&self) {
        if let Err(e) = self.client.http.logout().await {
            tracing::warn!("Logout request failed: {}", e);
        }

        self.client.http.clear_auth_token().await;
        if let Err(e) = self.client.token_store.clear() {
            tracing::warn!("Failed to clear stored tokens: {}", e);
        }

        *self.client.session.write().await = None;
        self.client.session_generation.fetch_add(1, Ordering::SeqCst);

        tracing::info!("Logged out");
    }

    /// Resume a session from durable tokens, if possible.
    ///
    /// Called on process start. Any failure — no stored tokens, storage
    /// fault, rejected or expired token — clears the stored pair and yields
    /// `None`; it never escalates to the caller.
    pub async fn check_auth(&self) -> Option<Session> {
        let stored = match self.client.token_store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Token store unreadable: {}", e);
                let _ = self.client.token_store.clear();
                return None;
            }
        };

        self.client
            .http
            .set_auth_token(Some(stored.access_token))
            .await;

        match self.client.http.me().await {
            Ok(profile) => {
                let session = Session::from(profile);
                *self.client.session.write().await = Some(session.clone());
                self.client.session_generation.fetch_add(1, Ordering::SeqCst);
                tracing::info!(user_id = session.user_id, "Session resumed");
                Some(session)
            }
            Err(e) => {
                tracing::info!("Stored session did not resolve: {}", e);
                self.client.http.clear_auth_token().await;
                if let Err(e) = self.client.token_store.clear() {
                    tracing::warn!("Failed to clear stored tokens: {}", e);
                }
                None
            }
        }
    }

    /// Rotate the access token using the stored refresh token.
    pub async fn refresh(&self) -> Result<(), SdkError> {
        let stored = self
            .client
            .token_store
            .load()?
            .ok_or(AuthError::NotAuthenticated)?;

        let request = RefreshRequest {
            refresh_token: stored.refresh_token,
        };
        let tokens = match self.client.http.refresh(&request).await {
            Ok(tokens) => tokens,
            Err(HttpError::Unauthorized) => return Err(AuthError::SessionExpired.into()),
            Err(e) => return Err(e.into()),
        };

        self.client
            .http
            .set_auth_token(Some(tokens.access_token.clone()))
            .await;
        self.client.token_store.save(&StoredTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })?;

        Ok(())
    }

    /// Current session, if one is established.
    pub async fn session(&self) -> Option<Session> {
        self.client.session.read().await.clone()
    }

    /// Whether a session is currently established.
    pub async fn is_authenticated(&self) -> bool {
        self.client
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.is_authenticated())
            .unwrap_or(false)
    }

    /// Gate pinned to the current session generation.
    pub fn gate(&self) -> SessionGate {
        SessionGate::observe(&self.client.session_generation)
    }
}
