//! Explicit authentication state for the discovery API.
//!
//! A [`Session`] is a plain value: who we are (`user_id`), which headers to
//! send, and when the access token stops being valid. The caller decides what
//! to do with it before each request via [`decide`].

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tokens are refreshed this long before their stated expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Token grant returned by the login-polling and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    authorization: Option<String>,
    cookie: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Session built from pre-captured header values. Never expires.
    #[must_use]
    pub fn from_static(
        user_id: &str,
        cookie: Option<String>,
        authorization: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.to_owned(),
            authorization,
            cookie,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Session built from a fresh token grant received at `now`.
    #[must_use]
    pub fn from_grant(user_id: &str, grant: &TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_owned(),
            authorization: Some(format!("Bearer {}", grant.access_token)),
            cookie: None,
            refresh_token: Some(grant.refresh_token.clone()),
            expires_at: Some(now + Duration::seconds(grant.access_token_ttl_seconds)),
        }
    }

    /// Returns a copy with the tokens replaced by `grant`, keeping the user.
    #[must_use]
    pub fn refreshed(&self, grant: &TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            cookie: self.cookie.clone(),
            ..Self::from_grant(&self.user_id, grant, now)
        }
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// `true` once `now` is within the refresh margin of the expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now >= at - Duration::seconds(REFRESH_MARGIN_SECS))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("authorization", &self.authorization.as_ref().map(|_| "[redacted]"))
            .field("cookie", &self.cookie.as_ref().map(|_| "[redacted]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What to do with the current session before the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Reuse,
    Refresh,
    Login,
}

/// Decides whether `session` can be reused at `now`, needs a token refresh,
/// or must be replaced by a full login.
#[must_use]
pub fn decide(session: Option<&Session>, now: DateTime<Utc>) -> SessionAction {
    match session {
        None => SessionAction::Login,
        Some(s) if !s.is_expired(now) => SessionAction::Reuse,
        Some(s) if s.refresh_token.is_some() => SessionAction::Refresh,
        Some(_) => SessionAction::Login,
    }
}
