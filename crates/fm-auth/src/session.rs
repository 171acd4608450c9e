//! Session lifecycle: token acquisition, expiry tracking, refresh and revocation.
//!
//! [`SessionManager`] holds the only live copy of `{token, expiresAt}` and
//! writes it through to a [`CredentialStore`]. All reads and writes of the
//! session go through one mutex, which also holds the handle of the refresh
//! currently in flight, if any.
//!
//! ## Single-flight refresh
//!
//! A refresh runs as a detached tokio task. Callers that find no usable
//! token either start that task or attach to the one already running, and
//! all of them receive its result. Dropping a caller's future never cancels
//! the task, so one impatient caller cannot abort a refresh others wait on.
//!
//! ```text
//! Unauthenticated ──refresh ok──▶ Active
//!        ▲                          │
//!        └──── expiry / revoke / invalidate
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, instrument, warn};

use fmdata_client::security::url::encode_segment;
use fmdata_client::{
    AuthScheme, Authorization, ClientConfig, DataApiClient, HttpTransport, OperationDescriptor,
    Transport,
};

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};
use crate::storage::{CredentialStore, StoredSession};

/// Lifetime the server promises for a new token (15 minutes).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 900;

/// How long before expiry a cached token stops being handed out.
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 5;

/// Token lifetime and expiry margin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time from acquisition until the token is considered expired.
    pub token_lifetime: Duration,
    /// A token within this distance of expiry is refreshed instead of reused.
    pub safety_margin: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            safety_margin: Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS),
        }
    }
}

impl SessionConfig {
    /// Set the token lifetime.
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Set the safety margin.
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Active,
}

#[derive(Clone, Default)]
struct Session {
    token: Option<String>,
    // Default is the epoch: "already expired".
    expires_at: DateTime<Utc>,
}

impl Session {
    fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && now < self.expires_at
    }

    fn usable_token(&self, now: DateTime<Utc>, margin: Duration) -> Option<&str> {
        if now < self.expires_at - margin {
            self.token.as_deref()
        } else {
            None
        }
    }
}

type RefreshResult = std::result::Result<String, Arc<Error>>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshResult>>;

struct Slot {
    session: Session,
    pending: Option<PendingRefresh>,
}

struct Inner<T: Transport> {
    client: DataApiClient<T>,
    credentials: Credentials,
    store: Arc<dyn CredentialStore>,
    config: SessionConfig,
    slot: Mutex<Slot>,
}

impl<T: Transport> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exchange the basic-auth secret for a new token.
    #[instrument(skip(self), fields(database = %self.credentials.database()))]
    async fn create_session(&self) -> Result<(String, DateTime<Utc>)> {
        // Expiry is counted from before the request leaves, so it never
        // outlives the server's own clock.
        let issued_at = Utc::now();

        let descriptor = OperationDescriptor::post("/sessions").with_auth(AuthScheme::Basic);
        let envelope = self
            .client
            .send(&descriptor, &self.credentials.basic_authorization())
            .await?;

        let token: String = envelope.project("token")?;
        if token.is_empty() {
            return Err(Error::new(ErrorKind::Protocol(
                "session response carried an empty token".to_string(),
            )));
        }

        Ok((token, issued_at + self.config.token_lifetime))
    }

    /// Body of the detached refresh task.
    async fn run_refresh(self: Arc<Self>) -> RefreshResult {
        let result = self.create_session().await;

        let mut slot = self.lock();
        slot.pending = None;

        match result {
            Ok((token, expires_at)) => {
                slot.session = Session {
                    token: Some(token.clone()),
                    expires_at,
                };
                let stored = StoredSession {
                    token: token.clone(),
                    expires_at,
                };
                if let Err(err) = self.store.save_session(&stored) {
                    warn!(error = %err, "Failed to persist session");
                }
                info!(%expires_at, "Session token refreshed");
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "Session refresh failed");
                Err(Arc::new(err))
            }
        }
    }

    /// Clear the session only if `token` is still the cached one.
    fn clear_if_current(&self, token: &str) -> bool {
        let mut slot = self.lock();
        if slot.session.token.as_deref() != Some(token) {
            return false;
        }

        slot.session = Session::default();
        if let Err(err) = self.store.clear_session() {
            warn!(error = %err, "Failed to clear persisted session");
        }
        true
    }
}

/// Owns the session token for one database.
///
/// Clone is cheap; clones share the same session.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use fmdata_auth::{Credentials, MemoryCredentialStore, SessionManager};
///
/// let sessions = SessionManager::new(
///     Credentials::from_env()?,
///     Arc::new(MemoryCredentialStore::new()),
/// )?;
/// let token = sessions.get_valid_token().await?;
/// ```
pub struct SessionManager<T: Transport = HttpTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> std::fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.inner.credentials)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionManager<HttpTransport> {
    /// Create a session manager with the default HTTP transport and config.
    pub fn new(credentials: Credentials, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Self::with_config(
            credentials,
            store,
            SessionConfig::default(),
            ClientConfig::default(),
        )
    }

    /// Create a session manager with explicit session and transport config.
    pub fn with_config(
        credentials: Credentials,
        store: Arc<dyn CredentialStore>,
        config: SessionConfig,
        client_config: ClientConfig,
    ) -> Result<Self> {
        let client = DataApiClient::with_config(credentials.endpoint()?, client_config)?;
        Ok(Self::with_client(client, credentials, store, config))
    }
}

impl<T: Transport> SessionManager<T> {
    /// Create a session manager over an existing client.
    ///
    /// A still-valid session found in `store` is adopted.
    pub fn with_client(
        client: DataApiClient<T>,
        credentials: Credentials,
        store: Arc<dyn CredentialStore>,
        config: SessionConfig,
    ) -> Self {
        let session = initial_session(store.as_ref());

        Self {
            inner: Arc::new(Inner {
                client,
                credentials,
                store,
                config,
                slot: Mutex::new(Slot {
                    session,
                    pending: None,
                }),
            }),
        }
    }

    /// The client used for session and record calls.
    pub fn client(&self) -> &DataApiClient<T> {
        &self.inner.client
    }

    /// The static credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// True when a token is cached and has not reached its expiry.
    ///
    /// No I/O, and no safety margin: for diagnostics only.
    pub fn is_active(&self) -> bool {
        self.inner.lock().session.is_active(Utc::now())
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        if self.is_active() {
            SessionState::Active
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Expiry of the cached token, if one is cached.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let slot = self.inner.lock();
        slot.session.token.as_ref().map(|_| slot.session.expires_at)
    }

    /// Return the cached token, refreshing first if it is missing or
    /// within the safety margin of expiry.
    ///
    /// Concurrent callers share one refresh.
    pub async fn get_valid_token(&self) -> Result<String> {
        let pending = {
            let mut slot = self.inner.lock();
            if let Some(token) = slot
                .session
                .usable_token(Utc::now(), self.inner.config.safety_margin)
            {
                return Ok(token.to_string());
            }
            self.join_or_start_refresh(&mut slot)
        };

        self.await_refresh(pending).await
    }

    /// Obtain a new token regardless of the cached one.
    ///
    /// Joins a refresh already in flight instead of starting another. On
    /// failure the previous session is left untouched.
    pub async fn refresh(&self) -> Result<String> {
        let pending = {
            let mut slot = self.inner.lock();
            self.join_or_start_refresh(&mut slot)
        };

        self.await_refresh(pending).await
    }

    /// Delete the session on the server, then clear it locally.
    ///
    /// The local session is cleared only when the server confirms with
    /// code `"0"`. With no cached token this is a no-op.
    #[instrument(skip(self), fields(database = %self.inner.credentials.database()))]
    pub async fn revoke(&self) -> Result<()> {
        let token = match self.inner.lock().session.token.clone() {
            Some(token) => token,
            None => {
                debug!("No session to revoke");
                return Ok(());
            }
        };

        let descriptor =
            OperationDescriptor::delete(format!("/sessions/{}", encode_segment(&token)))
                .with_auth(AuthScheme::None);

        if let Err(err) = self.inner.client.send(&descriptor, &Authorization::None).await {
            let err = Error::from(err);
            warn!(error = %err, "Server did not confirm session deletion");
            return Err(err);
        }

        self.inner.clear_if_current(&token);
        info!("Session revoked");
        Ok(())
    }

    /// Drop `token` after the server rejected it.
    ///
    /// Clears only if `token` is still the cached one, so a token obtained
    /// by a concurrent refresh survives. Returns whether anything was cleared.
    pub fn invalidate(&self, token: &str) -> bool {
        let cleared = self.inner.clear_if_current(token);
        if cleared {
            info!("Session invalidated after server rejected token");
        }
        cleared
    }

    fn join_or_start_refresh(&self, slot: &mut Slot) -> PendingRefresh {
        if let Some(pending) = &slot.pending {
            debug!("Joining refresh in flight");
            return pending.clone();
        }

        debug!("Starting session refresh");
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(Inner::run_refresh(Arc::clone(&inner)));

        let pending = async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    inner.lock().pending = None;
                    Err(Arc::new(Error::new(ErrorKind::Other(format!(
                        "refresh task failed: {}",
                        join_err
                    )))))
                }
            }
        }
        .boxed()
        .shared();

        slot.pending = Some(pending.clone());
        pending
    }

    async fn await_refresh(&self, pending: PendingRefresh) -> Result<String> {
        let token = pending.await.map_err(shared_error)?;

        // The refresh may have been overtaken by a revoke or invalidate
        // (never hand out a cleared token) or by a newer refresh (hand out
        // the authoritative one).
        let slot = self.inner.lock();
        match &slot.session.token {
            Some(current) if slot.session.is_active(Utc::now()) => {
                if *current != token {
                    debug!("Refresh overtaken by a newer token");
                }
                Ok(current.clone())
            }
            _ => Err(Error::new(ErrorKind::Other(
                "session was cleared while the refresh completed".to_string(),
            ))),
        }
    }
}

fn shared_error(err: Arc<Error>) -> Error {
    Error::with_source(err.kind.clone(), err)
}

fn initial_session(store: &dyn CredentialStore) -> Session {
    match store.load_session() {
        Ok(Some(stored)) if stored.expires_at > Utc::now() => {
            debug!(expires_at = %stored.expires_at, "Adopting persisted session");
            Session {
                token: Some(stored.token),
                expires_at: stored.expires_at,
            }
        }
        Ok(_) => Session::default(),
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable session cache");
            Session::default()
        }
    }
}
