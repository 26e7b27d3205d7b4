//! Device command handlers.

use std::sync::Arc;

use serde::Serialize;
use strum::VariantNames;
use tabled::Tabled;
use url::Url;

use acsdesk_core::{
    AddDeviceForm, Console, DetailLoader, Device, DeviceId, DeviceListView, LoadOutcome, LogLine,
    ParameterValue, SELECTION_PARAM, SelectionSync, SortDirection, SortKey,
};

use crate::cli::{DeviceListArgs, DevicesArgs, DevicesCommand};
use crate::error::CliError;
use crate::output::{self, Ui};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            model: d.model.clone(),
            status: d.status.to_string(),
            ip: d.ip_string(),
            firmware: d.firmware.clone(),
            customer: d.customer().unwrap_or_default().to_owned(),
            last_seen: d.last_seen.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&LogLine> for LogRow {
    fn from(line: &LogLine) -> Self {
        Self {
            time: line.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            message: line.message.clone(),
        }
    }
}

#[derive(Serialize)]
struct DeviceLink {
    device: DeviceId,
    location: Url,
}

fn detail(d: &Arc<Device>, color: bool) -> String {
    let mut lines = vec![
        format!("ID:        {}", d.id),
        format!("Name:      {}", d.name),
        format!("Model:     {}", d.model),
        format!("Serial:    {}", d.serial_number),
        format!("Status:    {}", output::paint_status(d.status, color)),
        format!(
            "IP:        {}",
            d.ip.map_or_else(|| "-".into(), |ip| ip.to_string())
        ),
        format!("MAC:       {}", d.mac_address),
        format!("Firmware:  {}", d.firmware),
        format!("Customer:  {}", d.customer().unwrap_or("-")),
        format!("Last Seen: {}", d.last_seen.format("%Y-%m-%d %H:%M:%S UTC")),
    ];
    if !d.parameters.is_empty() {
        lines.push(String::new());
        lines.push("Parameters:".into());
        let width = d.parameters.keys().map(String::len).max().unwrap_or(0);
        for (key, value) in &d.parameters {
            lines.push(format!("  {key:<width$}  {value}"));
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: DevicesArgs, ui: &Ui) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list) => {
            let view = list_view(list)?;
            let devices = output::with_spinner(ui, "Loading devices...", console.list_devices()).await;
            print_devices(&view.rows(&devices), ui)
        }

        DevicesCommand::Discover => {
            let devices =
                output::with_spinner(ui, "Discovering devices...", console.discover_devices()).await;
            print_devices(&devices, ui)
        }

        DevicesCommand::Get { id } => {
            let device = util::resolve_device(console, &id, ui).await?;
            print_device(&device, ui)
        }

        DevicesCommand::Add(add) => {
            let form = AddDeviceForm {
                serial_number: add.serial,
                mac_address: add.mac,
                model: add.model,
            };
            let device =
                output::with_spinner(ui, "Registering device...", console.add_device(&form)).await?;
            print_device(&device, ui)
        }

        DevicesCommand::Reboot { id } => {
            let device = util::resolve_device(console, &id, ui).await?;
            if !util::confirm(&format!("Reboot device {}?", device.id), "reboot", ui)? {
                return Ok(());
            }
            let sent =
                output::with_spinner(ui, "Sending reboot...", console.reboot_device(&device.id)).await;
            if sent {
                Ok(())
            } else {
                Err(CliError::OperationFailed {
                    operation: "Reboot".into(),
                })
            }
        }

        DevicesCommand::Firmware { id, url } => {
            let device = util::resolve_device(console, &id, ui).await?;
            let started = output::with_spinner(
                ui,
                "Scheduling firmware update...",
                console.update_firmware(&device.id, &url),
            )
            .await?;
            if started {
                Ok(())
            } else {
                Err(CliError::OperationFailed {
                    operation: "Firmware update".into(),
                })
            }
        }

        DevicesCommand::Logs { id } => {
            let device = util::resolve_device(console, &id, ui).await?;
            let lines =
                output::with_spinner(ui, "Fetching logs...", console.get_device_logs(&device.id)).await;
            let out = output::render_list(
                ui.format,
                &lines,
                |l| LogRow::from(l),
                ToString::to_string,
            )?;
            output::print_output(&out, ui.quiet);
            Ok(())
        }

        DevicesCommand::SetParam { id, key, value } => {
            let device = util::resolve_device(console, &id, ui).await?;
            let applied = output::with_spinner(
                ui,
                "Setting parameter...",
                console.set_device_parameter(&device.id, &key, ParameterValue::infer(&value)),
            )
            .await;
            if !applied {
                return Err(CliError::device_not_found(id));
            }
            let updated = util::resolve_device(console, &id, ui).await?;
            print_device(&updated, ui)
        }

        DevicesCommand::Link { id, location } => {
            let mut sync = SelectionSync::new(parse_location(&location, "location")?);
            let device = DeviceId::from(id);
            let location = sync.select(Some(device.clone())).clone();
            let link = DeviceLink { device, location };
            let out = output::render_single(
                ui.format,
                &link,
                |l| l.location.to_string(),
                |l| l.location.to_string(),
            )?;
            output::print_output(&out, ui.quiet);
            Ok(())
        }

        DevicesCommand::Open { url } => {
            let loader = DetailLoader::new(SelectionSync::new(parse_location(&url, "url")?));
            let outcome = output::with_spinner(ui, "Loading device...", loader.load(console)).await;
            match outcome {
                LoadOutcome::Loaded(device) => print_device(&device, ui),
                LoadOutcome::NotFound => Err(CliError::device_not_found(
                    loader.selected().map(|id| id.to_string()).unwrap_or_default(),
                )),
                LoadOutcome::NothingSelected => Err(CliError::Validation {
                    field: "url".into(),
                    reason: format!("link has no '{SELECTION_PARAM}' parameter"),
                }),
                LoadOutcome::Stale | LoadOutcome::Cancelled => {
                    Err(CliError::Internal("device detail load was interrupted".into()))
                }
            }
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn list_view(args: DeviceListArgs) -> Result<DeviceListView, CliError> {
    let sort_key: SortKey = args.sort.parse().map_err(|_| CliError::Validation {
        field: "sort".into(),
        reason: format!(
            "unknown column '{}', expected one of: {}",
            args.sort,
            SortKey::VARIANTS.join(", ")
        ),
    })?;
    Ok(DeviceListView {
        query: args.search.unwrap_or_default(),
        sort_key,
        direction: if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    })
}

fn parse_location(raw: &str, field: &str) -> Result<Url, CliError> {
    Url::parse(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {e}"),
    })
}

fn print_devices(devices: &[Arc<Device>], ui: &Ui) -> Result<(), CliError> {
    let out = output::render_list(
        ui.format,
        devices,
        |d| DeviceRow::from(d),
        |d| d.id.to_string(),
    )?;
    output::print_output(&out, ui.quiet);
    Ok(())
}

fn print_device(device: &Arc<Device>, ui: &Ui) -> Result<(), CliError> {
    let out = output::render_single(
        ui.format,
        device,
        |d| detail(d, ui.color),
        |d| d.id.to_string(),
    )?;
    output::print_output(&out, ui.quiet);
    Ok(())
}
