//! `fritzly query <command>...`

use serde::Serialize;
use tabled::Tabled;

use fritzly_core::Router;

use crate::cli::{GlobalOpts, QueryArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct QueryValue {
    command: String,
    value: String,
}

#[derive(Tabled)]
struct QueryRow {
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(router: &Router, args: QueryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    tracing::debug!(commands = args.commands.len(), "running query");

    let bar = util::attach_progress(router, global);
    let result = router.query(&args.commands).await;
    util::finish_progress(router, &bar);
    let values = result?;

    let rows: Vec<QueryValue> = args
        .commands
        .into_iter()
        .zip(values)
        .map(|(command, value)| QueryValue { command, value })
        .collect();

    let rendered = output::render_list(
        &global.output,
        &rows,
        |r| QueryRow {
            command: r.command.clone(),
            value: r.value.clone(),
        },
        |r| r.value.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
