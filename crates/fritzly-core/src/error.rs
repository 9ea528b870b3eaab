// ── Core error types ──
//
// User-facing errors from fritzly-core. Consumers never see raw reqwest
// errors or XML parse failures; the `From<fritzly_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session unusable: {reason}")]
    SessionInvalid { reason: String },

    #[error("Router request timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    // ── Query errors ─────────────────────────────────────────────────
    #[error("Router protocol error: {message}")]
    Protocol { message: String },

    #[error("Query item {index} is too long ({length} bytes, limit {limit})")]
    QueryTooLong {
        index: u32,
        length: usize,
        limit: usize,
    },

    #[error("HTTP error{}: {message}", status.map(|s| format!(" {s}")).unwrap_or_default())]
    Http {
        message: String,
        status: Option<u16>,
    },

    // ── Marshalling errors ───────────────────────────────────────────
    #[error("No converter named '{name}' in scope of '{command}'")]
    ConverterNotFound { name: String, command: String },

    #[error("Propagation nested deeper than {limit} levels")]
    PropagationTooDeep { limit: usize },

    #[error("Cannot convert value of '{command}': {message}")]
    Conversion { command: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fritzly_api::Error> for CoreError {
    fn from(err: fritzly_api::Error) -> Self {
        match err {
            fritzly_api::Error::LoginFailed { message } => {
                CoreError::AuthenticationFailed { message }
            }
            fritzly_api::Error::InvalidSession { reason } => CoreError::SessionInvalid { reason },
            fritzly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Http {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            fritzly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fritzly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            fritzly_api::Error::Cancelled => CoreError::Cancelled,
            fritzly_api::Error::Protocol { message } => CoreError::Protocol { message },
            fritzly_api::Error::ItemTooLong {
                index,
                length,
                limit,
            } => CoreError::QueryTooLong {
                index,
                length,
                limit,
            },
            fritzly_api::Error::Xml { message, body: _ } => CoreError::Protocol {
                message: format!("malformed session XML: {message}"),
            },
        }
    }
}
