pub mod config;
pub mod countries;
pub mod packages;
pub mod quote;
pub mod wizard;

use std::sync::Arc;

use coverquote_core::config::{AppConfig, LoadOptions};
use coverquote_core::{ApplicationError, ReferenceCatalog};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: Option<T>,
    ) -> Self {
        let data = match data.map(serde_json::to_value).transpose() {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps an application error through the interface taxonomy so the
    /// payload carries a stable error class.
    pub fn from_application_error(
        command: &str,
        error: ApplicationError,
        correlation_id: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let interface = error.into_interface(correlation_id);
        Self::failure(command, interface.error_class(), interface.to_string(), exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) struct Runtime {
    pub config: AppConfig,
    pub catalog: Arc<ReferenceCatalog>,
}

pub(crate) fn load_runtime(command: &str, options: LoadOptions) -> Result<Runtime, CommandResult> {
    let config = AppConfig::load(options).map_err(|error| {
        let error = ApplicationError::Configuration(error.to_string());
        CommandResult::failure(command, "config_validation", error.to_string(), 2)
    })?;

    let catalog = config.load_catalog().map_err(|error| {
        CommandResult::from_application_error(
            command,
            ApplicationError::ReferenceData(error.to_string()),
            "startup",
            2,
        )
    })?;

    Ok(Runtime { config, catalog: Arc::new(catalog) })
}
