//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fritzly_config::ConfigError;
use fritzly_core::CoreError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PROTOCOL: i32 = 9;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to router at {url}")]
    #[diagnostic(
        code(fritzly::connection_failed),
        help(
            "Check that the router is reachable and the address is right.\n\
             URL: {url}\n\
             Try: fritzly --host fritz.box status"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request failed: {message}")]
    #[diagnostic(code(fritzly::http))]
    Http { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(fritzly::timeout),
        help("Increase the timeout with --timeout or check the router's load.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login failed: {message}")]
    #[diagnostic(
        code(fritzly::auth_failed),
        help(
            "Verify username and password for profile '{profile}'.\n\
             Run: fritzly config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(fritzly::no_credentials),
        help(
            "Configure one with: fritzly config init\n\
             Or set the FRITZLY_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("Session unusable: {reason}")]
    #[diagnostic(code(fritzly::session))]
    SessionInvalid { reason: String },

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("Unexpected router response: {message}")]
    #[diagnostic(
        code(fritzly::protocol),
        help("The firmware may not know one of the requested commands.")
    )]
    Protocol { message: String },

    #[error("Query command {index} does not fit into one request ({length} > {limit} bytes)")]
    #[diagnostic(code(fritzly::query_too_long))]
    QueryTooLong {
        index: u32,
        length: usize,
        limit: usize,
    },

    #[error("Operation cancelled")]
    #[diagnostic(code(fritzly::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fritzly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fritzly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fritzly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(fritzly::no_config),
        help(
            "Create one with: fritzly config init\n\
             Or pass --host and set FRITZLY_PASSWORD.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Keyring access failed: {message}")]
    #[diagnostic(code(fritzly::keyring))]
    Keyring { message: String },

    #[error(transparent)]
    #[diagnostic(code(fritzly::config))]
    Config(Box<figment::Error>),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Http { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::SessionInvalid { .. } => {
                exit_code::AUTH
            }
            Self::Timeout => exit_code::TIMEOUT,
            Self::Protocol { .. } | Self::QueryTooLong { .. } => exit_code::PROTOCOL,
            Self::Cancelled => exit_code::CANCELLED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::SessionInvalid { reason } => CliError::SessionInvalid { reason },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Cancelled => CliError::Cancelled,
            CoreError::Protocol { message } => CliError::Protocol { message },
            CoreError::QueryTooLong {
                index,
                length,
                limit,
            } => CliError::QueryTooLong {
                index,
                length,
                limit,
            },
            CoreError::Http { message, status: _ } => CliError::Http { message },
            err @ (CoreError::ConverterNotFound { .. }
            | CoreError::PropagationTooDeep { .. }
            | CoreError::Conversion { .. }) => CliError::Protocol {
                message: err.to_string(),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
