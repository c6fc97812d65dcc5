//! Authentication — sessions, durable tokens, login/logout/check-auth.
//!
//! ## Security model
//!
//! - The access token lives inside the HTTP layer (private field) and is
//!   injected as an `Authorization: Bearer` header. It is never exposed via
//!   the public API; the relay receives it through a crate-internal path.
//! - Both tokens are persisted through a [`store::TokenStore`] so a restart
//!   can resume the session via [`client::Auth::check_auth`]. They are
//!   cleared on logout and on any failed session resolution.
//!
//! ## Session generation
//!
//! Every login, logout, and failed resolution bumps a generation counter.
//! A [`SessionGate`] captures the counter at relay start; the relay's
//! reconnect loop refuses to fire once the generation has moved on, which is
//! what ties the transport's lifetime to the session's.

pub mod store;

#[cfg(feature = "http")]
pub mod client;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session types
// ============================================================================

/// An established session: the authenticated user's identity.
///
/// The bearer tokens backing it are held by the HTTP layer and the token
/// store, never here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub is_active: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.is_active
    }
}

/// A snapshot of the session generation counter.
///
/// `is_current()` answers whether the session that existed when the gate was
/// taken is still the live one. Cheap to clone; safe to hold across awaits.
#[derive(Debug, Clone)]
pub struct SessionGate {
    counter: Arc<AtomicU64>,
    observed: u64,
}

impl SessionGate {
    /// Capture the current generation.
    pub fn observe(counter: &Arc<AtomicU64>) -> Self {
        Self {
            counter: Arc::clone(counter),
            observed: counter.load(Ordering::SeqCst),
        }
    }

    /// Whether no login/logout has happened since this gate was taken.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.observed
    }

    /// The generation this gate was taken at.
    pub fn generation(&self) -> u64 {
        self.observed
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Request body for `POST /api/v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Request body for `POST /api/v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Request body for `POST /api/v1/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User profile returned by `GET /api/v1/auth/me` and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub is_active: bool,
    #[serde(deserialize_with = "crate::shared::serde_util::flexible_utc::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "crate::shared::serde_util::flexible_utc::option::deserialize"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<UserProfile> for Session {
    fn from(profile: UserProfile) -> Self {
        Session {
            user_id: profile.id,
            email: profile.email,
            username: profile.username,
            is_active: profile.is_active,
        }
    }
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_current_until_bumped() {
        let counter = Arc::new(AtomicU64::new(0));
        let gate = SessionGate::observe(&counter);
        assert!(gate.is_current());

        counter.fetch_add(1, Ordering::SeqCst);
        assert!(!gate.is_current());

        // A freshly observed gate is current again
        assert!(SessionGate::observe(&counter).is_current());
    }

    #[test]
    fn test_profile_to_session() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"id":3,"email":"a@b.c","username":"ab","phone_number":null,
                "is_active":true,"created_at":"2026-08-01T10:00:00Z","updated_at":null}"#,
        )
        .unwrap();
        let session = Session::from(profile);
        assert_eq!(session.user_id, 3);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_token_response_defaults_bearer() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","refresh_token":"r"}"#).unwrap();
        assert_eq!(resp.token_type, "bearer");
    }
}
