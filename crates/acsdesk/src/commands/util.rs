//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use acsdesk_core::{Console, Device, DeviceId};

use crate::error::CliError;
use crate::output::{self, Ui};

/// Look a device up (provisioning it on first contact), or fail with a
/// not-found error naming the list command.
pub async fn resolve_device(console: &Console, id: &str, ui: &Ui) -> Result<Arc<Device>, CliError> {
    let device_id = DeviceId::from(id);
    output::with_spinner(ui, &format!("Contacting {id}..."), console.get_device(&device_id))
        .await
        .ok_or_else(|| CliError::device_not_found(id))
}

/// Ask before a device action. `--yes` answers for the user.
pub fn confirm(message: &str, action: &str, ui: &Ui) -> Result<bool, CliError> {
    if ui.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    Ok(confirmed)
}

/// Convert a dialoguer prompt error.
pub fn prompt_err(e: dialoguer::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}
