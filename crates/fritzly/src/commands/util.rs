//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use fritzly_core::Router;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "--yes".into(),
            reason: format!("'{message}' needs confirmation; pass --yes when not interactive"),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {e}"),
        })
}

/// Attach a progress bar to the router's query progress.
///
/// Hidden in quiet mode and when stderr is not a terminal. Call
/// [`finish_progress`] once the query is done.
pub fn attach_progress(router: &Router, global: &GlobalOpts) -> ProgressBar {
    let bar = if global.quiet || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message("querying");
    bar.enable_steady_tick(Duration::from_millis(100));

    let sink = bar.clone();
    router.set_progress(move |done, total| {
        sink.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        sink.set_position(u64::try_from(done).unwrap_or(u64::MAX));
    });
    bar
}

pub fn finish_progress(router: &Router, bar: &ProgressBar) {
    router.clear_progress();
    bar.finish_and_clear();
}

/// Split `key=value`. The key may not be empty; the value may.
pub fn parse_assignment(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(CliError::Validation {
            field: "assignment".into(),
            reason: format!("expected key=value, got '{raw}'"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn assignments() {
        assert_eq!(
            parse_assignment("wlan:settings/ssid=my=net").unwrap(),
            ("wlan:settings/ssid".to_owned(), "my=net".to_owned())
        );
        assert_eq!(parse_assignment("k=").unwrap().1, "");
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=1").is_err());
    }
}
