//! Command failures, their diagnostics and exit codes.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable process exit code.

use miette::Diagnostic;
use thiserror::Error;

use acsdesk_config::ConfigError;
use acsdesk_core::{CoreError, ValidationErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the ACS at {endpoint}")]
    #[diagnostic(
        code(acsdesk::connection_failed),
        help(
            "Check the ACS URL and port.\n\
             Current profile: acsdesk config show\n\
             Change it with: acsdesk config set --url <URL> --port <PORT>"
        )
    )]
    ConnectionFailed { endpoint: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(acsdesk::not_found),
        help("Run: acsdesk {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{operation} failed")]
    #[diagnostic(code(acsdesk::operation_failed), help("Re-run with -v for details."))]
    OperationFailed { operation: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(acsdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(acsdesk::settings),
        help("Inspect the settings file: acsdesk config path")
    )]
    Settings(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' needs confirmation but stdin is not a terminal")]
    #[diagnostic(
        code(acsdesk::confirmation_required),
        help("Pass --yes (-y) when scripting device actions.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────

    #[error("{0}")]
    #[diagnostic(code(acsdesk::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(acsdesk::render))]
    Render(String),
}

impl CliError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Settings(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::OperationFailed { .. }
            | Self::Settings(_)
            | Self::Internal(_)
            | Self::Io(_)
            | Self::Render(_) => exit_code::GENERAL,
        }
    }

    pub fn device_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "device".into(),
            identifier: id.into(),
            list_command: "devices list".into(),
        }
    }
}

// ── CoreError mapping ───────────────────────────────────────────────

impl From<ValidationErrors> for CliError {
    fn from(errors: ValidationErrors) -> Self {
        let field = errors
            .errors()
            .iter()
            .map(|e| e.field)
            .collect::<Vec<_>>()
            .join(", ");
        Self::Validation {
            field,
            reason: errors.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => errors.into(),
            CoreError::DeviceNotFound { id } => Self::device_not_found(id),
            CoreError::ConnectionFailed { endpoint, .. } => Self::ConnectionFailed { endpoint },
            other => Self::Internal(other.to_string()),
        }
    }
}
