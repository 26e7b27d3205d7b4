//! Config subcommand handlers.

use std::io::IsTerminal;
use std::path::Path;

use dialoguer::Password;
use serde::Serialize;

use acsdesk_config::Settings;
use acsdesk_core::{AcsConfig, AcsConfigForm, Console};

use crate::cli::{ConfigArgs, ConfigCommand, ConfigSetArgs, ConfigTestArgs};
use crate::error::CliError;
use crate::output::{self, Ui};

use super::util::prompt_err;

// ── Views ───────────────────────────────────────────────────────────

const REDACTED: &str = "****";

/// The ACS profile as displayed, password masked.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileView<'a> {
    url: &'a str,
    port: u16,
    username: &'a str,
    password: &'static str,
    inform_interval: u32,
    connection_request_allowed: bool,
}

impl<'a> From<&'a AcsConfig> for ProfileView<'a> {
    fn from(cfg: &'a AcsConfig) -> Self {
        Self {
            url: &cfg.url,
            port: cfg.port,
            username: &cfg.username,
            password: REDACTED,
            inform_interval: cfg.inform_interval,
            connection_request_allowed: cfg.connection_request_allowed,
        }
    }
}

#[derive(Serialize)]
struct ConfigView<'a> {
    settings: &'a Settings,
    acs: ProfileView<'a>,
}

#[derive(Serialize)]
struct PathsView {
    settings: String,
    storage: String,
}

fn profile_detail(p: &ProfileView<'_>) -> String {
    [
        format!("URL:                 {}", p.url),
        format!("Port:                {}", p.port),
        format!("Username:            {}", p.username),
        format!("Password:            {}", p.password),
        format!("Inform interval:     {}s", p.inform_interval),
        format!("Connection requests: {}", p.connection_request_allowed),
    ]
    .join("\n")
}

fn config_detail(view: &ConfigView<'_>) -> String {
    let settings = toml::to_string_pretty(view.settings).unwrap_or_default();
    format!("{}\n[acs]\n{}", settings.trim_end(), profile_detail(&view.acs))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: ConfigArgs,
    settings: &Settings,
    settings_path: &Path,
    ui: &Ui,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let active = console.get_config();
            let view = ConfigView {
                settings,
                acs: ProfileView::from(&*active),
            };
            let out = output::render_single(ui.format, &view, config_detail, |v| {
                v.acs.url.to_owned()
            })?;
            output::print_output(&out, ui.quiet);
            Ok(())
        }

        ConfigCommand::Set(set) => set_profile(console, set, ui).await,

        ConfigCommand::Test(test) => test_profile(console, test, ui).await,

        ConfigCommand::Path => {
            let paths = PathsView {
                settings: settings_path.display().to_string(),
                storage: settings.storage().dir().display().to_string(),
            };
            let out = output::render_single(
                ui.format,
                &paths,
                |p| format!("Settings: {}\nStorage:  {}", p.settings, p.storage),
                |p| p.settings.clone(),
            )?;
            output::print_output(&out, ui.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if settings_path.exists() && !force {
                return Err(CliError::Validation {
                    field: "settings".into(),
                    reason: format!(
                        "{} already exists; pass --force to overwrite",
                        settings_path.display()
                    ),
                });
            }
            acsdesk_config::save_settings_to(settings, settings_path)?;
            output::print_output(&settings_path.display().to_string(), ui.quiet);
            Ok(())
        }
    }
}

async fn set_profile(console: &Console, set: ConfigSetArgs, ui: &Ui) -> Result<(), CliError> {
    let mut form = AcsConfigForm::from_config(&console.get_config());
    let mut changed = false;

    if let Some(url) = set.url {
        form.url = url;
        changed = true;
    }
    if let Some(port) = set.port {
        form.port = port;
        changed = true;
    }
    if let Some(username) = set.username {
        form.username = username;
        changed = true;
    }
    if let Some(password) = set.password {
        form.password = if password.is_empty() {
            prompt_password()?
        } else {
            password
        };
        changed = true;
    }
    if let Some(interval) = set.inform_interval {
        form.inform_interval = interval;
        changed = true;
    }
    if let Some(allowed) = set.connection_requests {
        form.connection_request_allowed = allowed;
        changed = true;
    }
    if !changed {
        return Err(CliError::Validation {
            field: "config set".into(),
            reason: "no field given; see acsdesk config set --help".into(),
        });
    }

    let saved = output::with_spinner(ui, "Saving settings...", console.save_config(&form)).await?;
    if !saved {
        return Err(CliError::OperationFailed {
            operation: "Saving settings".into(),
        });
    }
    let active = console.get_config();
    let profile = ProfileView::from(&*active);
    let out = output::render_single(ui.format, &profile, profile_detail, |p| p.url.to_owned())?;
    output::print_output(&out, ui.quiet);
    Ok(())
}

async fn test_profile(console: &Console, test: ConfigTestArgs, ui: &Ui) -> Result<(), CliError> {
    let active = console.get_config();
    let candidate = if test.url.is_some() || test.port.is_some() {
        let mut form = AcsConfigForm::from_config(&active);
        if let Some(url) = test.url {
            form.url = url;
        }
        if let Some(port) = test.port {
            form.port = port;
        }
        form.validate()?
    } else {
        (*active).clone()
    };

    let reachable = output::with_spinner(
        ui,
        &format!("Contacting {}...", candidate.endpoint()),
        console.test_connection(Some(&candidate)),
    )
    .await;
    if reachable {
        Ok(())
    } else {
        Err(CliError::ConnectionFailed {
            endpoint: candidate.endpoint(),
        })
    }
}

fn prompt_password() -> Result<String, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "a value is required when not running interactively".into(),
        });
    }
    Password::new()
        .with_prompt("ACS password")
        .interact()
        .map_err(prompt_err)
}
