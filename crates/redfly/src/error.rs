//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with exit codes.

use miette::Diagnostic;
use thiserror::Error;

use redfly_config::ConfigError;
use redfly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const PLUGIN: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(redfly::config),
        help("Check the configuration file; `redfly config-path` shows where it is read from.")
    )]
    Config(#[from] ConfigError),

    // ── Authentication ───────────────────────────────────────────────
    #[error("unable to create session with plugin {plugin_id}")]
    #[diagnostic(
        code(redfly::no_session),
        help("Verify the plugin's username and password in the configuration.")
    )]
    SessionUnavailable { plugin_id: String },

    // ── Plugins ──────────────────────────────────────────────────────
    #[error("plugin {plugin_id} is not responding")]
    #[diagnostic(
        code(redfly::plugin_down),
        help("The status probe got no successful answer from the plugin.")
    )]
    PluginUnreachable { plugin_id: String },

    #[error("{message}")]
    #[diagnostic(code(redfly::plugin_error), help("Plugin answered HTTP {status}:\n{body}"))]
    Plugin {
        status: u16,
        message: String,
        body: String,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(redfly::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(redfly::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(redfly::json), help("Check the --data value and try again."))]
    Json(#[from] serde_json::Error),

    // ── Other ────────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(redfly::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::SessionUnavailable { .. } => exit_code::AUTH,
            Self::PluginUnreachable { .. } | Self::Plugin { .. } => exit_code::PLUGIN,
            Self::NotFound { .. } | Self::Validation { .. } | Self::Json(_) | Self::Internal(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::SessionUnavailable { plugin_id } => Self::SessionUnavailable { plugin_id },
            CoreError::Plugin {
                status,
                message,
                body,
            } => Self::Plugin {
                status,
                message,
                body: serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()),
            },
            CoreError::InvalidRequest(reason) => Self::Validation {
                field: "request body".into(),
                reason,
            },
            other @ (CoreError::Decryption(_) | CoreError::Internal(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<redfly_api::Error> for CliError {
    fn from(err: redfly_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
