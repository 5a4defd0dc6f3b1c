//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders snapshots and the parameter catalog in the format selected by
//! `--output`. Table uses `tabled`, structured formats use serde, plain
//! emits `key=value` lines.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use vento_core::catalog::{self, ParameterInfo};
use vento_core::{ParameterId, ParameterValue, Snapshot, format_value};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Views ────────────────────────────────────────────────────────────

/// One decoded parameter, ready for any output format.
#[derive(Debug, Serialize)]
pub struct ParamView {
    pub id: ParameterId,
    pub key: Option<&'static str>,
    pub name: String,
    pub raw: ParameterValue,
    pub value: String,
}

impl ParamView {
    fn new(id: ParameterId, raw: ParameterValue) -> Self {
        let info = catalog::lookup(id);
        Self {
            id,
            key: info.map(|i| i.key),
            name: info.map_or_else(|| format!("Parameter {id}"), |i| i.name.to_owned()),
            raw,
            value: format_value(id, &raw),
        }
    }

    /// Catalog key, or the hex id for uncatalogued parameters.
    fn label(&self) -> String {
        self.key.map_or_else(|| self.id.to_string(), str::to_owned)
    }

    /// `key=value`; values with spaces (`1200 rpm`) are double-quoted so
    /// each pair stays one shell word.
    fn pair(&self) -> String {
        if self.value.contains(char::is_whitespace) {
            format!("{}=\"{}\"", self.label(), self.value)
        } else {
            format!("{}={}", self.label(), self.value)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SnapshotView {
    pub received_at: DateTime<Utc>,
    pub parameters: Vec<ParamView>,
}

impl From<&Snapshot> for SnapshotView {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            received_at: snapshot.received_at(),
            parameters: snapshot
                .iter()
                .map(|(id, raw)| ParamView::new(*id, *raw))
                .collect(),
        }
    }
}

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Parameter")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Raw")]
    raw: String,
}

impl From<&ParamView> for ParamRow {
    fn from(p: &ParamView) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            value: p.value.clone(),
            raw: p.raw.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    id: ParameterId,
    key: &'static str,
    name: &'static str,
    unit: Option<&'static str>,
    polled_by_default: bool,
}

impl From<&ParameterInfo> for CatalogEntry {
    fn from(info: &ParameterInfo) -> Self {
        Self {
            id: info.id,
            key: info.key,
            name: info.name,
            unit: info.unit,
            polled_by_default: ParameterId::DEFAULTS.contains(&info.id),
        }
    }
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Unit")]
    unit: &'static str,
    #[tabled(rename = "Default")]
    default: &'static str,
}

impl From<&CatalogEntry> for CatalogRow {
    fn from(e: &CatalogEntry) -> Self {
        Self {
            id: e.id.to_string(),
            key: e.key,
            name: e.name,
            unit: e.unit.unwrap_or("-"),
            default: if e.polled_by_default { "yes" } else { "no" },
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one snapshot in the chosen format.
pub fn render_snapshot(format: OutputFormat, snapshot: &Snapshot) -> Result<String, CliError> {
    let view = SnapshotView::from(snapshot);
    match format {
        OutputFormat::Table => {
            let rows: Vec<ParamRow> = view.parameters.iter().map(ParamRow::from).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(&view, false),
        OutputFormat::JsonCompact => render_json(&view, true),
        OutputFormat::Yaml => render_yaml(&view),
        OutputFormat::Plain => Ok(view
            .parameters
            .iter()
            .map(ParamView::pair)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render one snapshot as a single streaming record (used by `watch`).
///
/// JSON formats become one compact line per update; table becomes a
/// timestamped summary line.
pub fn render_update(format: OutputFormat, snapshot: &Snapshot) -> Result<String, CliError> {
    let view = SnapshotView::from(snapshot);
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(&view, true),
        OutputFormat::Yaml => Ok(format!("---\n{}", render_yaml(&view)?)),
        OutputFormat::Table | OutputFormat::Plain => {
            let fields = view
                .parameters
                .iter()
                .map(ParamView::pair)
                .collect::<Vec<_>>()
                .join(" ");
            Ok(format!("{} {fields}", timestamp(view.received_at)))
        }
    }
}

/// Render the parameter catalog.
pub fn render_catalog(format: OutputFormat) -> Result<String, CliError> {
    let entries: Vec<CatalogEntry> = catalog::all().iter().map(CatalogEntry::from).collect();
    match format {
        OutputFormat::Table => {
            let rows: Vec<CatalogRow> = entries.iter().map(CatalogRow::from).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(&entries, false),
        OutputFormat::JsonCompact => render_json(&entries, true),
        OutputFormat::Yaml => render_yaml(&entries),
        OutputFormat::Plain => Ok(entries
            .iter()
            .map(|e| e.key)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// A failed poll cycle, for stderr.
pub fn render_failure(message: &str, at: DateTime<Utc>, color: bool) -> String {
    let stamp = timestamp(at);
    if color {
        format!("{} {} {message}", stamp.dimmed(), "poll failed:".red().bold())
    } else {
        format!("{stamp} poll failed: {message}")
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
