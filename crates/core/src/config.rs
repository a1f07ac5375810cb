use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flows::engine::{WizardPolicy, DEFAULT_MAX_AGE};
use crate::pricing::catalog::{CatalogError, ReferenceCatalog};
use crate::session::DEFAULT_AGE;

pub const CONFIG_FILE_NAME: &str = "coverquote.toml";

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub wizard: WizardConfig,
    pub reference: ReferenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardConfig {
    pub default_age: u32,
    pub default_country: Option<String>,
    pub default_package: Option<String>,
    pub max_age: u32,
    pub require_name: bool,
    pub clear_fields_on_reset: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceConfig {
    /// TOML file with `[[countries]]` and `[[packages]]`; built-in tables when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub reference_path: Option<PathBuf>,
    pub max_age: Option<u32>,
    pub require_name: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            default_age: DEFAULT_AGE,
            default_country: None,
            default_package: None,
            max_age: DEFAULT_MAX_AGE,
            require_name: true,
            clear_fields_on_reset: true,
        }
    }
}

impl WizardConfig {
    pub fn policy(&self) -> WizardPolicy {
        WizardPolicy {
            max_age: self.max_age,
            require_name: self.require_name,
            clear_fields_on_reset: self.clear_fields_on_reset,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Reference catalog named by `reference.path`, or the built-in tables.
    pub fn load_catalog(&self) -> Result<ReferenceCatalog, CatalogError> {
        ReferenceCatalog::load_or_builtin(self.reference.path.as_deref())
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(wizard) = patch.wizard {
            if let Some(default_age) = wizard.default_age {
                self.wizard.default_age = default_age;
            }
            if let Some(default_country) = wizard.default_country {
                self.wizard.default_country = Some(default_country);
            }
            if let Some(default_package) = wizard.default_package {
                self.wizard.default_package = Some(default_package);
            }
            if let Some(max_age) = wizard.max_age {
                self.wizard.max_age = max_age;
            }
            if let Some(require_name) = wizard.require_name {
                self.wizard.require_name = require_name;
            }
            if let Some(clear_fields_on_reset) = wizard.clear_fields_on_reset {
                self.wizard.clear_fields_on_reset = clear_fields_on_reset;
            }
        }

        if let Some(reference) = patch.reference {
            if let Some(path) = reference.path {
                self.reference.path = Some(path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("COVERQUOTE_WIZARD_DEFAULT_AGE") {
            self.wizard.default_age = parse_u32("COVERQUOTE_WIZARD_DEFAULT_AGE", &value)?;
        }
        if let Some(value) = read_env("COVERQUOTE_WIZARD_DEFAULT_COUNTRY") {
            self.wizard.default_country = Some(value);
        }
        if let Some(value) = read_env("COVERQUOTE_WIZARD_DEFAULT_PACKAGE") {
            self.wizard.default_package = Some(value);
        }
        if let Some(value) = read_env("COVERQUOTE_WIZARD_MAX_AGE") {
            self.wizard.max_age = parse_u32("COVERQUOTE_WIZARD_MAX_AGE", &value)?;
        }
        if let Some(value) = read_env("COVERQUOTE_WIZARD_REQUIRE_NAME") {
            self.wizard.require_name = parse_bool("COVERQUOTE_WIZARD_REQUIRE_NAME", &value)?;
        }
        if let Some(value) = read_env("COVERQUOTE_WIZARD_CLEAR_FIELDS_ON_RESET") {
            self.wizard.clear_fields_on_reset =
                parse_bool("COVERQUOTE_WIZARD_CLEAR_FIELDS_ON_RESET", &value)?;
        }

        if let Some(value) = read_env("COVERQUOTE_REFERENCE_PATH") {
            self.reference.path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("COVERQUOTE_LOGGING_LEVEL").or_else(|| read_env("COVERQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("COVERQUOTE_LOGGING_FORMAT").or_else(|| read_env("COVERQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(reference_path) = overrides.reference_path {
            self.reference.path = Some(reference_path);
        }
        if let Some(max_age) = overrides.max_age {
            self.wizard.max_age = max_age;
        }
        if let Some(require_name) = overrides.require_name {
            self.wizard.require_name = require_name;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_wizard(&self.wizard)?;
        validate_reference(&self.reference)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_wizard(wizard: &WizardConfig) -> Result<(), ConfigError> {
    if wizard.max_age == 0 {
        return Err(ConfigError::Validation(
            "wizard.max_age must be greater than zero".to_string(),
        ));
    }

    let blank = |value: &Option<String>| value.as_ref().is_some_and(|id| id.trim().is_empty());
    if blank(&wizard.default_country) {
        return Err(ConfigError::Validation(
            "wizard.default_country must not be blank when set".to_string(),
        ));
    }
    if blank(&wizard.default_package) {
        return Err(ConfigError::Validation(
            "wizard.default_package must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_reference(reference: &ReferenceConfig) -> Result<(), ConfigError> {
    if let Some(path) = &reference.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "reference.path must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    wizard: Option<WizardPatch>,
    reference: Option<ReferencePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WizardPatch {
    default_age: Option<u32>,
    default_country: Option<String>,
    default_package: Option<String>,
    max_age: Option<u32>,
    require_name: Option<bool>,
    clear_fields_on_reset: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ReferencePatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
