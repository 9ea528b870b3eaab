//! `fritzly session check|logout`

use serde::Serialize;

use fritzly_core::Router;

use crate::cli::{GlobalOpts, SessionArgs, SessionCommand};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SessionReport {
    host: String,
    username: Option<String>,
    valid: bool,
    idle_timeout_secs: u64,
    auto_reconnect: bool,
}

pub async fn handle(
    router: &Router,
    args: SessionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Check => {
            let valid = router.check().await?;
            let config = router.config();
            let report = SessionReport {
                host: config.url.to_string(),
                username: config.username.clone(),
                valid,
                idle_timeout_secs: config.idle_timeout.as_secs(),
                auto_reconnect: config.auto_reconnect,
            };

            let color = output::should_color(&global.color);
            let rendered = output::render_single(
                &global.output,
                &report,
                |r| {
                    [
                        output::detail_line("Host", &r.host, color),
                        output::detail_line("User", r.username.as_deref().unwrap_or("-"), color),
                        output::detail_line("Session", if r.valid { "valid" } else { "rejected" }, color),
                        output::detail_line("Idle timeout", &format!("{}s", r.idle_timeout_secs), color),
                        output::detail_line("Reconnect", if r.auto_reconnect { "yes" } else { "no" }, color),
                    ]
                    .join("\n")
                },
                |r| r.valid.to_string(),
            );
            output::print_output(&rendered, global.quiet);

            if valid {
                Ok(())
            } else {
                Err(CliError::SessionInvalid {
                    reason: "router rejected the fresh session".into(),
                })
            }
        }

        SessionCommand::Logout => {
            let acknowledged = router.disconnect().await?;
            if !global.quiet {
                if acknowledged {
                    eprintln!("Logged out");
                } else {
                    eprintln!("Session dropped; the router did not confirm the logout");
                }
            }
            Ok(())
        }
    }
}
