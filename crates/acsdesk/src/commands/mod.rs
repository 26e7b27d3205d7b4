//! Command dispatch: bridges CLI args -> console operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod util;

use std::path::Path;

use acsdesk_config::Settings;
use acsdesk_core::Console;

use crate::cli::Command;
use crate::error::CliError;
use crate::output::{self, Ui};

/// Dispatch a console-bound command, then report the notifications it
/// raised on stderr.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    settings: &Settings,
    settings_path: &Path,
    ui: &Ui,
) -> Result<(), CliError> {
    let mut notifications = console.subscribe_notifications();
    let result = match cmd {
        Command::Devices(args) => devices::handle(console, args, ui).await,
        Command::Config(args) => config_cmd::handle(console, args, settings, settings_path, ui).await,
        // Completions is handled before dispatch
        Command::Completions(_) => Ok(()),
    };
    output::drain_notifications(&mut notifications, ui);
    result
}
