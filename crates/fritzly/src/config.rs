//! CLI configuration: a thin wrapper around `fritzly_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --username, --insecure, --timeout).

use std::time::Duration;

use fritzly_core::{ConnectionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use fritzly_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ConnectionConfig` from the config file, active profile, and
/// CLI overrides. Without a profile, `--host` plus an environment
/// password is enough.
pub fn build_connection_config(global: &GlobalOpts) -> Result<ConnectionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            let host = global.host.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile {
                host,
                ..Profile::default()
            }
        }
    };

    resolve_profile(&profile, &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `ConnectionConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &fritzly_config::Defaults,
    global: &GlobalOpts,
) -> Result<ConnectionConfig, CliError> {
    let mut config = fritzly_config::profile_to_connection_config(profile, profile_name, defaults)?;

    if let Some(ref host) = global.host {
        config.url = fritzly_config::parse_host(host)?;
    }
    if let Some(ref username) = global.username {
        config.username = Some(username.clone());
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}
