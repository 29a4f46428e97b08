//! HTTP client for the Too Good To Go mobile API.
//!
//! Wraps `reqwest` with the app's default headers, a cookie store, typed
//! errors, and the email-login flow. Every request takes the [`Session`] it
//! should authenticate with; the client itself holds no auth state.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tgtg_core::DiscoverResults;

use crate::error::ClientError;
use crate::retry::retry_with_backoff;
use crate::session::{Session, TokenGrant};

const DEVICE_TYPE: &str = "IOS";

/// Search origin and radius for a discovery call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub radius_km: f64,
}

#[derive(Debug, Deserialize)]
struct AuthByEmailResponse {
    state: String,
    #[serde(default)]
    polling_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartupResponse {
    user: StartupUser,
}

#[derive(Debug, Deserialize)]
struct StartupUser {
    user_id: String,
}

/// Client for the discovery API.
///
/// The base URL comes from configuration, so tests point it at a mock server.
pub struct TgtgClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    login_poll_interval: Duration,
    login_max_polls: u32,
}

impl TgtgClient {
    /// Creates a client with a custom base URL.
    ///
    /// Retries default to off and login polling to 5 s × 20; adjust with
    /// [`TgtgClient::with_retry`] and [`TgtgClient::with_login_polling`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ClientError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-CA"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            max_retries: 0,
            backoff_base_ms: 1_000,
            login_poll_interval: Duration::from_secs(5),
            login_max_polls: 20,
        })
    }

    /// Sets the retry policy for discovery calls.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Sets how often and how many times to poll while waiting for the user
    /// to confirm the login email.
    #[must_use]
    pub fn with_login_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.login_poll_interval = interval;
        self.login_max_polls = max_polls;
        self
    }

    /// Logs in by email and returns a fresh session.
    ///
    /// Sends the login email, then polls until the user clicks the link
    /// (HTTP 200 with tokens) while the API answers HTTP 202. Finally calls
    /// `onStartup` to learn the user id.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if the API does not enter the `WAIT` state.
    /// - [`ClientError::LoginTimedOut`] if the email is not confirmed in time.
    /// - [`ClientError::UnexpectedStatus`] for any other polling status.
    /// - [`ClientError::Http`] / [`ClientError::Deserialize`] on transport or
    ///   shape failures.
    pub async fn login_by_email(&self, email: &str) -> Result<Session, ClientError> {
        let response = self
            .post(
                "auth/v3/authByEmail",
                None,
                &json!({ "device_type": DEVICE_TYPE, "email": email }),
            )
            .await?;
        let started: AuthByEmailResponse =
            decode(Self::check_status(response)?, "authByEmail").await?;

        let polling_id = match (started.state.as_str(), started.polling_id) {
            ("WAIT", Some(id)) => id,
            (state, _) => {
                return Err(ClientError::Auth(format!(
                    "email login not accepted (state {state})"
                )))
            }
        };

        let grant = self.wait_for_email(email, &polling_id).await?;
        let provisional = Session::from_grant("", &grant, Utc::now());

        let response = self
            .post("app/v1/onStartup", Some(&provisional), &json!({}))
            .await?;
        let startup: StartupResponse = decode(Self::check_status(response)?, "onStartup").await?;

        tracing::info!(user_id = %startup.user.user_id, "logged in to discovery API");
        Ok(Session::from_grant(&startup.user.user_id, &grant, Utc::now()))
    }

    async fn wait_for_email(&self, email: &str, polling_id: &str) -> Result<TokenGrant, ClientError> {
        let body = json!({
            "device_type": DEVICE_TYPE,
            "email": email,
            "request_polling_id": polling_id,
        });

        for attempt in 1..=self.login_max_polls {
            let response = self
                .post("auth/v3/authByRequestPollingId", None, &body)
                .await?;
            match response.status() {
                StatusCode::OK => return decode(response, "authByRequestPollingId").await,
                StatusCode::ACCEPTED => {
                    tracing::info!(attempt, "waiting for login email to be confirmed");
                    tokio::time::sleep(self.login_poll_interval).await;
                }
                status => {
                    return Err(ClientError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: response.url().to_string(),
                    })
                }
            }
        }

        Err(ClientError::LoginTimedOut {
            attempts: self.login_max_polls,
        })
    }

    /// Exchanges the session's refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if `session` holds no refresh token.
    /// - [`ClientError::UnexpectedStatus`] / [`ClientError::Http`] /
    ///   [`ClientError::Deserialize`] on request failure.
    pub async fn refresh(&self, session: &Session, email: &str) -> Result<Session, ClientError> {
        let Some(refresh_token) = session.refresh_token() else {
            return Err(ClientError::Auth("session has no refresh token".to_owned()));
        };

        let response = self
            .post(
                "auth/v3/token/refresh",
                Some(session),
                &json!({
                    "device_type": DEVICE_TYPE,
                    "email": email,
                    "refresh_token": refresh_token,
                }),
            )
            .await?;
        let grant: TokenGrant = decode(Self::check_status(response)?, "token/refresh").await?;

        tracing::debug!(ttl_secs = grant.access_token_ttl_seconds, "refreshed access token");
        Ok(session.refreshed(&grant, Utc::now()))
    }

    /// Fetches the discovery buckets around `location`, retrying transient
    /// failures.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Payload`] if the body is not a discovery response.
    /// - [`ClientError::RateLimited`] / [`ClientError::UnexpectedStatus`] /
    ///   [`ClientError::Http`] once retries are exhausted.
    pub async fn discover(
        &self,
        session: &Session,
        location: &Location,
    ) -> Result<DiscoverResults, ClientError> {
        let body = discover_body(&session.user_id, location);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let body = body.clone();
            async move {
                let response = self.post("discover/v1", Some(session), &body).await?;
                let text = Self::check_status(response)?.text().await?;
                serde_json::from_str::<DiscoverResults>(&text).map_err(ClientError::Payload)
            }
        })
        .await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: format!("cannot join \"{path}\": {e}"),
            })
    }

    async fn post(
        &self,
        path: &str,
        session: Option<&Session>,
        body: &serde_json::Value,
    ) -> Result<Response, ClientError> {
        let url = self.endpoint(path)?;
        let mut request = self.client.post(url).json(body);

        if let Some(session) = session {
            if let Some(auth) = session.authorization() {
                request = request.header(header::AUTHORIZATION, auth);
            }
            if let Some(cookie) = session.cookie() {
                request = request.header(header::COOKIE, cookie);
            }
        }

        Ok(request.send().await?)
    }

    /// Maps non-2xx responses to typed errors.
    fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ClientError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, ClientError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

/// Request body for `discover/v1`, mirroring what the iOS app sends.
fn discover_body(user_id: &str, location: &Location) -> serde_json::Value {
    json!({
        "experimental_group": "Default",
        "debug_mode": false,
        "user_id": user_id,
        "supported_buckets": [
            {
                "type": "ACTION",
                "display_types": [
                    "CAROUSEL",
                    "DONATION",
                    "HOW_IT_WORKS",
                    "JOB_APPLICATION",
                    "RATE_ORDER",
                    "USER_REFERRAL"
                ]
            },
            {
                "type": "HEADER",
                "display_types": ["SOLD_OUT", "ALMOST_SOLD_OUT", "NOTHING_NEARBY", "NOT_LIVE_HERE"]
            },
            {
                "type": "ITEM",
                "display_types": [
                    "CATEGORY",
                    "CLASSIC",
                    "FAVORITES",
                    "RECOMMENDATIONS",
                    "PREFERENCES",
                    "CHARITY",
                    "VERTICAL"
                ]
            },
            { "type": "STORE", "display_types": ["LOGO_ONLY"] }
        ],
        "origin": {
            "longitude": location.longitude,
            "latitude": location.latitude
        },
        "radius": location.radius_km
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
