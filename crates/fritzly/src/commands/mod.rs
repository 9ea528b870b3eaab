//! Command dispatch: bridges CLI args -> router calls -> output formatting.

pub mod config_cmd;
pub mod query;
pub mod session;
pub mod set;
pub mod status;
pub mod util;

use fritzly_core::Router;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a router-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, router: &Router, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(router, global).await,
        Command::Query(args) => query::handle(router, args, global).await,
        Command::Set(args) => set::handle(router, args, global).await,
        Command::Session(args) => session::handle(router, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
