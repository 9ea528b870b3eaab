//! Rendering of router values for `--output`.
//!
//! Two shapes exist: value lists (`query`) and detail views (`status`,
//! `session check`, `config show`). Plain output is meant for shell
//! pipelines and carries bare values only.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// A section heading for detail views.
pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_owned()
    }
}

/// An aligned `key: value` line for detail views.
pub fn detail_line(key: &str, value: &str, color: bool) -> String {
    let key = format!("{key:<14}");
    if color {
        format!("  {} {value}", key.dimmed())
    } else {
        format!("  {key} {value}")
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render query results, one entry per requested command.
///
/// Tables show the `to_row` projection and structured formats keep the full
/// records. Plain prints `plain_fn` of each record on its own line.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&plain_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render one record as a detail view.
///
/// The default format shows the sectioned text from `detail_fn`; plain
/// prints the single value a script would want from it.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Write to stdout unless `--quiet` or nothing was rendered.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("serialization should not fail")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        command: String,
        value: String,
    }

    #[derive(Tabled)]
    struct Row {
        command: String,
    }

    fn items() -> Vec<Item> {
        vec![Item {
            command: "x".into(),
            value: "5".into(),
        }]
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &items(),
            |i| Row {
                command: i.command.clone(),
            },
            |i| i.value.clone(),
        );
        assert_eq!(out, r#"[{"command":"x","value":"5"}]"#);
    }

    #[test]
    fn plain_uses_plain_fn() {
        let out = render_list(
            &OutputFormat::Plain,
            &items(),
            |i| Row {
                command: i.command.clone(),
            },
            |i| i.value.clone(),
        );
        assert_eq!(out, "5");
    }

    #[test]
    fn uncolored_detail_line_is_aligned() {
        assert_eq!(detail_line("SSID", "home", false), "  SSID           home");
    }
}
