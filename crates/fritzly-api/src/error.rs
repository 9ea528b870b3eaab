use thiserror::Error;

/// Top-level error type for the `fritzly-api` crate.
///
/// Covers every failure mode of the router interface: authentication,
/// session lifecycle, transport, and the query protocol.
/// `fritzly-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The router rejected the challenge response.
    #[error("Login failed: {message}")]
    LoginFailed { message: String },

    /// No session was started, or it idled out with reconnect disabled.
    #[error("Invalid session: {reason}")]
    InvalidSession { reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, HTTP status, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The caller's cancellation token fired while the operation was running.
    #[error("Operation cancelled")]
    Cancelled,

    // ── Protocol ────────────────────────────────────────────────────
    /// The router answered with something we cannot make sense of.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A single query item does not fit into one request URL.
    #[error("Query item {index} is too long to be sent ({length} bytes, limit {limit})")]
    ItemTooLong {
        index: u32,
        length: usize,
        limit: usize,
    },

    /// The login endpoint returned XML that does not parse, with the raw body.
    #[error("Malformed session XML: {message}")]
    Xml { message: String, body: String },
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns `true` if this error indicates the session is gone
    /// and logging in again might resolve it.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::LoginFailed { .. } | Self::InvalidSession { .. })
    }

    /// Returns `true` if the operation was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
