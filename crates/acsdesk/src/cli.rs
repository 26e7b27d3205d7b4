//! Clap derive structures for the `acsdesk` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-level ───────────────────────────────────────────────────────

/// acsdesk: console for a TR-069 auto-configuration server
#[derive(Debug, Parser)]
#[command(
    name = "acsdesk",
    version,
    about = "Manage CPE devices through a TR-069 auto-configuration server",
    long_about = "Browse, provision and operate CPE devices (routers, ONTs) managed by \
        an Auto Configuration Server.\n\n\
        The ACS link is simulated: operations wait for a realistic round-trip \
        and the device registry lives for the duration of one invocation.",
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

// ── Global Options ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file to use instead of the platform default
    #[arg(long, env = "ACSDESK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: settings `defaults.output`, else table]
    #[arg(short, long, env = "ACSDESK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color [default: settings `defaults.color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Skip the simulated network latency
    #[arg(long, global = true)]
    pub instant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Command Tree ────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and operate managed devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Inspect and change the ACS connection profile
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List known devices, discovering the network if none are known
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Force a discovery sweep and list the result
    Discover,

    /// Show one device, provisioning it on first contact
    Get {
        /// Device id
        id: String,
    },

    /// Register a device by hand
    Add(DeviceAddArgs),

    /// Reboot a device
    Reboot {
        /// Device id
        id: String,
    },

    /// Start a firmware update from a download URL
    Firmware {
        /// Device id
        id: String,

        /// Absolute URL of the firmware image
        #[arg(long)]
        url: String,
    },

    /// Show a device's recent log
    Logs {
        /// Device id
        id: String,
    },

    /// Set one TR-069 parameter on a device
    SetParam {
        /// Device id
        id: String,

        /// Parameter path (e.g. Device.WiFi.SSID.1.SSID)
        key: String,

        /// New value; true/false and numbers are typed, anything else is text
        value: String,
    },

    /// Print a shareable console link that selects a device
    Link {
        /// Device id
        id: String,

        /// Console location to rewrite
        #[arg(long, default_value = "http://localhost:8080/devices")]
        location: String,
    },

    /// Show the device selected by a console link
    Open {
        /// Console link carrying a `device` query parameter
        url: String,
    },
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// Case-insensitive substring match on id, name, serial, model, IP and customer
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Column to sort by: id, name, model, serialNumber, ip, macAddress,
    /// firmware, status, lastSeen, customer
    #[arg(long, default_value = "id")]
    pub sort: String,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Debug, Args)]
pub struct DeviceAddArgs {
    /// Serial number (at least 5 characters)
    #[arg(long)]
    pub serial: String,

    /// MAC address (AA:BB:CC:DD:EE:FF)
    #[arg(long)]
    pub mac: String,

    /// Model name (at least 2 characters)
    #[arg(long)]
    pub model: String,
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show settings and the active ACS profile (password redacted)
    Show,

    /// Change fields of the ACS profile
    Set(ConfigSetArgs),

    /// Test the connection to the ACS
    Test(ConfigTestArgs),

    /// Print settings and storage locations
    Path,

    /// Write the effective settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct ConfigSetArgs {
    /// ACS URL
    #[arg(long)]
    pub url: Option<String>,

    /// ACS port (1-65535)
    #[arg(long)]
    pub port: Option<i64>,

    /// ACS username
    #[arg(long)]
    pub username: Option<String>,

    /// ACS password (prompted when given without a value)
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub password: Option<String>,

    /// Seconds between periodic Informs (30-86400)
    #[arg(long)]
    pub inform_interval: Option<i64>,

    /// Allow connection requests from the ACS
    #[arg(long)]
    pub connection_requests: Option<bool>,
}

#[derive(Debug, Args)]
pub struct ConfigTestArgs {
    /// Test this URL instead of the saved one
    #[arg(long)]
    pub url: Option<String>,

    /// Test this port instead of the saved one
    #[arg(long)]
    pub port: Option<i64>,
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
