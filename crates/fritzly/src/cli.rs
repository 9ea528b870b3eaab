//! Clap derive structures for the `fritzly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fritzly -- status and control for FRITZ!Box routers
#[derive(Debug, Parser)]
#[command(
    name = "fritzly",
    version,
    about = "Query and control FRITZ!Box routers from the command line",
    long_about = "Talks to the router's Lua web interface: logs in with the\n\
        challenge-response scheme, reads status values in bulk through\n\
        query.lua, and submits settings through webcm.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Router profile to use
    #[arg(long, short = 'p', env = "FRITZLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router address, URL or bare host (overrides profile)
    #[arg(long, short = 'H', env = "FRITZLY_HOST", global = true)]
    pub host: Option<String>,

    /// Login username (overrides profile)
    #[arg(long, short = 'u', env = "FRITZLY_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FRITZLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FRITZLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FRITZLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show device, line, internet, and WLAN status
    #[command(alias = "st")]
    Status,

    /// Read raw values by query command
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Submit settings as key=value pairs
    Set(SetArgs),

    /// Inspect or end the router session
    Session(SessionArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Query / Set ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query commands, e.g. sar:status/dsl_ds_rate
    #[arg(required = true, num_args = 1..)]
    pub commands: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Settings to submit, e.g. wlan:settings/ap_enabled=1
    #[arg(required = true, num_args = 1..)]
    pub assignments: Vec<String>,
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Log in and verify the router accepts the session
    Check,

    /// Log in, then log out explicitly and report the acknowledgement
    Logout,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (passwords masked)
    Show,

    /// Store a profile password in the system keyring
    SetPassword,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// List configured profiles
    Profiles,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
