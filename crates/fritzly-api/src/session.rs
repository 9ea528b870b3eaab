// Session lifecycle
//
// Holds the current session identity, the last-action timestamp, and the
// idle/reconnect policy. Every authenticated call passes through
// `force_session`, which revalidates an idle session and reconnects when
// allowed. Login, logout, and invalidate live in `auth.rs`; the bulk query
// engine lives in `query/`.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::query::DEFAULT_MAX_URL_LENGTH;
use crate::sid::SessionId;
use crate::transport::{self, TransportConfig};

/// Externally observable session state. Login is atomic from the caller's
/// point of view, so there is no "authenticating" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Idle and reconnect policy for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long a session may sit unused before it is revalidated.
    /// `Duration::ZERO` disables the check.
    pub idle_timeout: Duration,
    /// Log in again when an idle session turns out to be gone.
    pub auto_reconnect: bool,
    /// Byte budget for a single `query.lua` request URL.
    pub max_url_length: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10 * 60),
            auto_reconnect: true,
            max_url_length: DEFAULT_MAX_URL_LENGTH,
        }
    }
}

/// An authenticated (or not yet authenticated) session with one router.
///
/// Safe to share across tasks: the identity is swapped atomically and the
/// last-action timestamp is lock-guarded, so concurrent partition fetches
/// can all record activity. Two independently started operations that
/// both need to reconnect will race each other; callers that care
/// serialize top-level operations (the core `Router` does).
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    options: SessionOptions,
    sid: ArcSwap<SessionId>,
    /// `None` until the first successful login, and again after logout.
    last_action: RwLock<Option<Instant>>,
}

impl Session {
    /// Create a session from a `TransportConfig`. Does not log in.
    ///
    /// `base_url` is the router root, e.g. `http://fritz.box`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        options: SessionOptions,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials, options))
    }

    /// Create a session with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        options: SessionOptions,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            options,
            sid: ArcSwap::from_pointee(SessionId::invalid()),
            last_action: RwLock::new(None),
        }
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The current session identity.
    pub fn sid(&self) -> Arc<SessionId> {
        self.sid.load_full()
    }

    pub fn state(&self) -> SessionState {
        if self.sid.load().is_valid() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Time since the last successful exchange, if the session ever started.
    pub fn idle_for(&self) -> Option<Duration> {
        self.last_action
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|at| at.elapsed())
    }

    // ── State transitions ────────────────────────────────────────────

    /// Record a successful exchange.
    pub(crate) fn touch(&self) {
        *self
            .last_action
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    /// Replace the identity with a freshly issued one.
    pub(crate) fn adopt(&self, sid: SessionId) {
        debug!("session identity replaced");
        self.sid.store(Arc::new(sid));
        self.touch();
    }

    /// Drop back to the unauthenticated state.
    pub(crate) fn reset(&self) {
        self.sid.store(Arc::new(SessionId::invalid()));
        *self
            .last_action
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    // ── Session gate ─────────────────────────────────────────────────

    /// Make sure the session is usable before an authenticated call.
    ///
    /// Fails with `InvalidSession` if no login ever happened. An idle
    /// session is revalidated with the router; if it is gone, it is
    /// re-established when auto-reconnect is on and reset otherwise.
    pub async fn force_session(&self, cancel: &CancellationToken) -> Result<(), Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if !self.sid.load().is_valid() {
            return Err(Error::InvalidSession {
                reason: "session not started".into(),
            });
        }

        let timeout = self.options.idle_timeout;
        if timeout.is_zero() {
            return Ok(());
        }
        let idle = self.idle_for().unwrap_or(Duration::MAX);
        if idle <= timeout {
            return Ok(());
        }

        debug!(?idle, ?timeout, "session idle past timeout, revalidating");
        if self.invalidate(cancel).await? {
            return Ok(());
        }

        if !self.options.auto_reconnect {
            self.reset();
            return Err(Error::InvalidSession {
                reason: "session timed out".into(),
            });
        }

        warn!("session expired while idle, reconnecting");
        self.login(cancel).await
    }

    // ── Command submission ───────────────────────────────────────────

    /// Submit control commands to `POST /cgi-bin/webcm`.
    ///
    /// Each pair becomes one form field after the `sid`. The router's
    /// answer is opaque and returned as-is.
    pub async fn submit(
        &self,
        commands: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.force_session(cancel).await?;

        let url = self.endpoint("/cgi-bin/webcm")?;
        let sid = self.sid();
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(commands.len() + 1);
        form.push(("sid", sid.as_str()));
        form.extend(commands.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(%url, commands = commands.len(), "submitting commands");
        let body = transport::send_text(self.http.post(url).form(&form), cancel).await?;
        self.touch();
        Ok(body)
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    /// Build an endpoint URL carrying the current `sid` as its first argument.
    pub(crate) fn endpoint_with_sid(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair("sid", self.sid().as_str());
        Ok(url)
    }
}
