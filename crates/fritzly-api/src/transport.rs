// Shared transport configuration and request plumbing.
//
// Every exchange with the router goes through `send_text`, which applies
// the caller's cancellation token: when it fires, the in-flight request
// future is dropped (aborting the connection) and `Error::Cancelled` is
// surfaced instead of a transport error.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::Error;

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (the router ships a self-signed one).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("fritzly/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Run `fut` unless `cancel` fires first.
///
/// Fails fast without polling `fut` if the token is already cancelled.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}

/// Send a request and read the body as text.
///
/// Non-2xx statuses surface as `Error::Transport`.
pub(crate) async fn send_text(
    builder: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<String, Error> {
    cancellable(cancel, async move {
        let resp = builder.send().await.map_err(Error::Transport)?;
        let resp = resp.error_for_status().map_err(Error::Transport)?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(bytes = body.len(), "response body received");
        Ok(body)
    })
    .await
}
