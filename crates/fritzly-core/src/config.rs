// ── Runtime connection configuration ──
//
// Describes how to reach and log in to a router. Carries credentials and
// session tuning but never touches disk: the CLI resolves its profile into
// a `ConnectionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use fritzly_api::{SessionOptions, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

pub const DEFAULT_URL: &str = "http://fritz.box";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. The router ships a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one router connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Router root URL (e.g. `http://fritz.box`).
    pub url: Url,
    /// Older firmware logs in with the password alone.
    pub username: Option<String>,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Idle time after which the session is revalidated. Zero disables it.
    pub idle_timeout: Duration,
    pub auto_reconnect: bool,
    /// Byte budget for one query URL.
    pub max_url_length: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let session = SessionOptions::default();
        Self {
            url: Url::parse(DEFAULT_URL).expect("default router URL is valid"),
            username: None,
            password: SecretString::from(String::new()),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            idle_timeout: session.idle_timeout,
            auto_reconnect: session.auto_reconnect,
            max_url_length: session.max_url_length,
        }
    }
}

impl ConnectionConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    pub(crate) fn session_options(&self) -> SessionOptions {
        SessionOptions {
            idle_timeout: self.idle_timeout,
            auto_reconnect: self.auto_reconnect,
            max_url_length: self.max_url_length,
        }
    }
}
