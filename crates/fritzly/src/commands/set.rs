//! `fritzly set <key=value>...`

use fritzly_core::Router;

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(router: &Router, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let commands = args
        .assignments
        .into_iter()
        .map(|a| util::parse_assignment(&a))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = commands
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    if !util::confirm(&format!("Apply {summary}?"), global.yes)? {
        return Ok(());
    }

    let response = router.submit(&commands).await?;
    tracing::debug!(bytes = response.len(), "router answered submission");

    if !global.quiet {
        eprintln!("Submitted {} setting(s)", commands.len());
    }
    Ok(())
}
