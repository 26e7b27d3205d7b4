//! Rendering of command results.
//!
//! `--output` picks the shape: `tabled` rows, a serde document, or one
//! identifier per line for piping.
//! Notifications and spinners go to stderr so stdout stays parseable.

use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};
use tokio::sync::broadcast::{self, error::TryRecvError};

use acsdesk_config::Settings;
use acsdesk_core::{DeviceStatus, Notification, NotificationLevel};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Resolved output options ─────────────────────────────────────────

/// Output options after merging flags with settings defaults.
#[derive(Debug, Clone, Copy)]
pub struct Ui {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl Ui {
    pub fn resolve(global: &GlobalOpts, settings: &Settings) -> Self {
        let format = global
            .output
            .or_else(|| OutputFormat::from_str(&settings.defaults.output, true).ok())
            .unwrap_or(OutputFormat::Table);
        let color = global
            .color
            .or_else(|| ColorMode::from_str(&settings.defaults.color, true).ok())
            .unwrap_or(ColorMode::Auto);
        Self {
            format,
            color: should_color(color),
            quiet: global.quiet,
            yes: global.yes,
        }
    }
}

// ── Color helpers ───────────────────────────────────────────────────

/// `auto` colors only a terminal without `NO_COLOR`.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_status(status: DeviceStatus, color: bool) -> String {
    let label: &'static str = status.into();
    if !color {
        return label.to_owned();
    }
    match status {
        DeviceStatus::Online => label.green().to_string(),
        DeviceStatus::Offline => label.red().to_string(),
        DeviceStatus::Warning => label.yellow().to_string(),
    }
}

// ── Render dispatchers ──────────────────────────────────────────────

/// Render `data` as rows, a document, or bare identifiers.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single item. Table mode uses the pre-formatted `detail_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Write to stdout unless `--quiet`.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ───────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

// ── Progress ────────────────────────────────────────────────────────

/// Await `fut` behind a stderr spinner. Nothing is drawn in quiet mode or
/// when stderr is not a terminal.
pub async fn with_spinner<F: Future>(ui: &Ui, message: &str, fut: F) -> F::Output {
    if ui.quiet || !io::stderr().is_terminal() {
        return fut.await;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let output = fut.await;
    spinner.finish_and_clear();
    output
}

// ── Notifications ───────────────────────────────────────────────────

/// Print every notification queued on `rx` to stderr.
pub fn drain_notifications(rx: &mut broadcast::Receiver<Arc<Notification>>, ui: &Ui) {
    loop {
        match rx.try_recv() {
            Ok(notification) => print_notification(&notification, ui),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "notifications dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn print_notification(notification: &Notification, ui: &Ui) {
    // Errors are shown even in quiet mode.
    if ui.quiet && !notification.is_error() {
        return;
    }
    let marker = match notification.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Info => "•",
        NotificationLevel::Error => "✗",
    };
    let title = if ui.color {
        match notification.level {
            NotificationLevel::Success => notification.title.green().bold().to_string(),
            NotificationLevel::Info => notification.title.cyan().bold().to_string(),
            NotificationLevel::Error => notification.title.red().bold().to_string(),
        }
    } else {
        notification.title.clone()
    };
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{marker} {title}: {}", notification.description);
}
