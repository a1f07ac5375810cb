use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use coverquote_core::config::{AppConfig, LoadOptions, CONFIG_FILE_NAME};
use coverquote_core::ApplicationError;
use toml::Value;

use crate::commands::CommandResult;

/// Plain-text report of every effective setting and where it came from.
/// A config that fails to load exits with 2.
pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let error = ApplicationError::Configuration(error.to_string());
            return CommandResult {
                exit_code: 2,
                output: format!("config validation failed: {error}"),
            };
        }
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "wizard.default_age",
        &config.wizard.default_age.to_string(),
        source("wizard.default_age", &["COVERQUOTE_WIZARD_DEFAULT_AGE"]),
    ));
    lines.push(render_line(
        "wizard.default_country",
        config.wizard.default_country.as_deref().unwrap_or("<first catalog country>"),
        source("wizard.default_country", &["COVERQUOTE_WIZARD_DEFAULT_COUNTRY"]),
    ));
    lines.push(render_line(
        "wizard.default_package",
        config.wizard.default_package.as_deref().unwrap_or("<first catalog package>"),
        source("wizard.default_package", &["COVERQUOTE_WIZARD_DEFAULT_PACKAGE"]),
    ));
    lines.push(render_line(
        "wizard.max_age",
        &config.wizard.max_age.to_string(),
        source("wizard.max_age", &["COVERQUOTE_WIZARD_MAX_AGE"]),
    ));
    lines.push(render_line(
        "wizard.require_name",
        &config.wizard.require_name.to_string(),
        source("wizard.require_name", &["COVERQUOTE_WIZARD_REQUIRE_NAME"]),
    ));
    lines.push(render_line(
        "wizard.clear_fields_on_reset",
        &config.wizard.clear_fields_on_reset.to_string(),
        source("wizard.clear_fields_on_reset", &["COVERQUOTE_WIZARD_CLEAR_FIELDS_ON_RESET"]),
    ));

    let reference_path = config
        .reference
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string());
    lines.push(render_line(
        "reference.path",
        &reference_path,
        source("reference.path", &["COVERQUOTE_REFERENCE_PATH"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["COVERQUOTE_LOGGING_LEVEL", "COVERQUOTE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["COVERQUOTE_LOGGING_FORMAT", "COVERQUOTE_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from(CONFIG_FILE_NAME);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(CONFIG_FILE_NAME);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env = env_keys.iter().find(|key| {
        env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
