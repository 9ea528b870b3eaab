// ── Router facade ──
//
// One handle per router: owns the session, serializes top-level
// operations, and carries the cancellation token and progress callback
// every query runs with.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use fritzly_api::{Credentials, Progress, Session, SessionState};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::marshal::{self, QuerySource, Queryable};
use crate::model::RouterStatus;

/// How long a one-shot run waits for the closing logout.
const LOGOUT_GRACE: Duration = Duration::from_secs(5);

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<RouterInner>`. Operations started from
/// different clones still run one at a time, so an idle-timeout reconnect
/// never races another one.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    config: ConnectionConfig,
    session: Session,
    op_lock: Mutex<()>,
    cancel: CancellationToken,
    progress: RwLock<Option<Arc<Progress>>>,
}

impl Router {
    /// Create a router handle from configuration. Does NOT log in;
    /// call [`connect()`](Self::connect) first.
    pub fn new(config: ConnectionConfig) -> Result<Self, CoreError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let session = Session::new(
            config.url.clone(),
            credentials,
            config.session_options(),
            &config.transport(),
        )?;
        Ok(Self::with_session(config, session))
    }

    /// Wrap an already built session.
    pub fn with_session(config: ConnectionConfig, session: Session) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                config,
                session,
                op_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                progress: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Report `(received, requested)` value counts while queries run.
    pub fn set_progress<F>(&self, callback: F)
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        *self
            .inner
            .progress
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    pub fn clear_progress(&self) {
        *self
            .inner
            .progress
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn progress(&self) -> Option<Arc<Progress>> {
        self.inner
            .progress
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Abort whatever is running and fail everything after it with
    /// `Cancelled`. Not reversible: build a new `Router` to continue.
    pub fn cancel(&self) {
        debug!("router operations cancelled");
        self.inner.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Log in, or adopt a session the router still considers live.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _guard = self.inner.op_lock.lock().await;
        debug!(url = %self.inner.config.url, "connecting");
        self.inner.session.login(&self.inner.cancel).await?;
        info!(url = %self.inner.config.url, "connected");
        Ok(())
    }

    /// Log out. Returns whether the router acknowledged it; a router
    /// handle that never connected has nothing to do.
    pub async fn disconnect(&self) -> Result<bool, CoreError> {
        let _guard = self.inner.op_lock.lock().await;
        if self.inner.session.state() == SessionState::Unauthenticated {
            return Ok(false);
        }
        let acknowledged = self.inner.session.logout(&self.inner.cancel).await?;
        info!(acknowledged, "disconnected");
        Ok(acknowledged)
    }

    /// Log out on a token of its own, so a cancelled router still frees
    /// its slot on the router. Bounded by `LOGOUT_GRACE`.
    async fn release(&self) -> Result<bool, CoreError> {
        let _guard = self.inner.op_lock.lock().await;
        if self.inner.session.state() == SessionState::Unauthenticated {
            return Ok(false);
        }
        let token = CancellationToken::new();
        match tokio::time::timeout(LOGOUT_GRACE, self.inner.session.logout(&token)).await {
            Ok(acknowledged) => Ok(acknowledged?),
            Err(_) => Err(CoreError::Timeout),
        }
    }

    /// Ask the router whether the current session is still alive.
    pub async fn check(&self) -> Result<bool, CoreError> {
        let _guard = self.inner.op_lock.lock().await;
        if self.inner.session.state() == SessionState::Unauthenticated {
            return Ok(false);
        }
        Ok(self.inner.session.invalidate(&self.inner.cancel).await?)
    }

    // ── Queries and commands ─────────────────────────────────────────

    /// Raw values for `commands`, in request order.
    pub async fn query<S>(&self, commands: &[S]) -> Result<Vec<String>, CoreError>
    where
        S: AsRef<str> + Sync,
    {
        let _guard = self.inner.op_lock.lock().await;
        let progress = self.progress();
        let values = self
            .inner
            .session
            .query(commands, progress.as_deref(), &self.inner.cancel)
            .await?;
        Ok(values)
    }

    /// Fill every field `target` describes with one batched query.
    pub async fn fetch<Q>(&self, target: &mut Q) -> Result<(), CoreError>
    where
        Q: Queryable + ?Sized,
    {
        marshal::marshal(target, self).await
    }

    /// Send control commands (`key=value` pairs) to the router.
    pub async fn submit(&self, commands: &[(String, String)]) -> Result<String, CoreError> {
        let _guard = self.inner.op_lock.lock().await;
        Ok(self
            .inner
            .session
            .submit(commands, &self.inner.cancel)
            .await?)
    }

    /// Device, line, connection, and WLAN status in one query.
    pub async fn status(&self) -> Result<RouterStatus, CoreError> {
        let mut status = RouterStatus::default();
        self.fetch(&mut status).await?;
        Ok(status)
    }

    // ── One-shot mode ────────────────────────────────────────────────

    /// Connect, run `f`, and log out again, for single CLI invocations.
    ///
    /// The logout runs even if `f` cancelled the router. A failed logout is
    /// only logged; the result of `f` wins.
    pub async fn oneshot<F, Fut, T, E>(config: ConnectionConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(Router) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let router = Router::new(config)?;
        router.connect().await?;
        let result = f(router.clone()).await;
        if let Err(e) = router.release().await {
            warn!(error = %e, "logout after one-shot command failed");
        }
        result
    }
}

impl QuerySource for Router {
    async fn query_values(&self, commands: &[String]) -> Result<Vec<String>, CoreError> {
        self.query(commands).await
    }
}
