//! A discovery source: client + credentials + location + the session they
//! produce, bundled so the refresh loop can ask for "the next payload".

use chrono::Utc;
use tgtg_core::{Credentials, DiscoverResults};

use crate::client::{Location, TgtgClient};
use crate::error::ClientError;
use crate::session::{decide, Session, SessionAction};

pub struct Discovery {
    client: TgtgClient,
    credentials: Credentials,
    location: Location,
    session: Option<Session>,
}

impl Discovery {
    /// Static credentials yield a ready session immediately; email
    /// credentials log in lazily on the first fetch.
    #[must_use]
    pub fn new(client: TgtgClient, credentials: Credentials, location: Location) -> Self {
        let session = static_session(&credentials);
        Self {
            client,
            credentials,
            location,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Fetches one discovery payload, logging in or refreshing first if the
    /// session calls for it.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClientError`] from authentication or the discover call.
    pub async fn fetch(&mut self) -> Result<DiscoverResults, ClientError> {
        self.ensure_session().await?;
        match &self.session {
            Some(session) => self.client.discover(session, &self.location).await,
            None => Err(ClientError::Auth("no session available".to_owned())),
        }
    }

    async fn ensure_session(&mut self) -> Result<(), ClientError> {
        match decide(self.session.as_ref(), Utc::now()) {
            SessionAction::Reuse => Ok(()),
            SessionAction::Refresh => {
                let refreshed = match (&self.session, &self.credentials) {
                    (Some(current), Credentials::Email { email }) => {
                        Some(self.client.refresh(current, email).await)
                    }
                    _ => None,
                };
                match refreshed {
                    Some(Ok(next)) => {
                        self.session = Some(next);
                        Ok(())
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "token refresh failed; logging in again");
                        self.login().await
                    }
                    None => self.login().await,
                }
            }
            SessionAction::Login => self.login().await,
        }
    }

    async fn login(&mut self) -> Result<(), ClientError> {
        self.session = None;
        let session = match &self.credentials {
            Credentials::Email { email } => self.client.login_by_email(email).await?,
            Credentials::Static { .. } => static_session(&self.credentials)
                .ok_or_else(|| ClientError::Auth("static credentials unavailable".to_owned()))?,
        };
        self.session = Some(session);
        Ok(())
    }
}

fn static_session(credentials: &Credentials) -> Option<Session> {
    match credentials {
        Credentials::Static {
            user_id,
            cookie,
            authorization,
        } => Some(Session::from_static(
            user_id,
            cookie.clone(),
            authorization.clone(),
        )),
        Credentials::Email { .. } => None,
    }
}
