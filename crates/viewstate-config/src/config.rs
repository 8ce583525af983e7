// crates/viewstate-config/src/config.rs
// ============================================================================
// Module: Viewstate Configuration
// Description: Configuration loading and validation for viewstate hosts.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: viewstate-core, serde, serde_json, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Invalid configuration fails closed; a missing default file falls back to
//! built-in defaults only through [`ViewstateConfig::load_or_default`].
//!
//! JSON schema files referenced by `resolver.schema_path` are read with the
//! same limits and must pass [`Schema::validate`] before a host uses them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use viewstate_core::BUILTIN_SCHEMAS;
use viewstate_core::FileResolutionSink;
use viewstate_core::FixedPointMode;
use viewstate_core::InputLimits;
use viewstate_core::NoopResolutionSink;
use viewstate_core::ResolutionSink;
use viewstate_core::ResolverConfig;
use viewstate_core::Schema;
use viewstate_core::StderrResolutionSink;
use viewstate_core::builtin_schema;
use viewstate_core::is_builtin_schema;
use viewstate_core::raw::DEFAULT_MAX_PAIRS;
use viewstate_core::raw::DEFAULT_MAX_VALUE_BYTES;
use viewstate_core::schemas::explorer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "viewstate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "VIEWSTATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum JSON schema file size in bytes.
pub const MAX_SCHEMA_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a schema name.
pub(crate) const MAX_SCHEMA_NAME_LENGTH: usize = 64;
/// Upper bound for `limits.max_pairs`.
pub const MAX_INPUT_PAIRS: usize = 4096;
/// Upper bound for `limits.max_value_bytes`.
pub const MAX_INPUT_VALUE_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for a viewstate host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewstateConfig {
    /// Schema selection and verification settings.
    #[serde(default)]
    pub resolver: ResolverSection,
    /// Raw input limits.
    #[serde(default)]
    pub limits: LimitsSection,
    /// Resolution event sink settings.
    #[serde(default)]
    pub audit: AuditSection,
}

impl ViewstateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then [`CONFIG_ENV_VAR`], then
    /// `viewstate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration, using defaults when no source is present.
    ///
    /// Defaults apply only when `path` is `None`, [`CONFIG_ENV_VAR`] is unset,
    /// and no `viewstate.toml` exists in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a config source exists but is invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none()
            && env::var_os(CONFIG_ENV_VAR).is_none()
            && !Path::new(DEFAULT_CONFIG_NAME).exists()
        {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver.validate()?;
        self.limits.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Replaces the schema selection with the built-in schema `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `name` is not a built-in schema.
    pub fn with_builtin_schema(mut self, name: &str) -> Result<Self, ConfigError> {
        self.resolver.schema = name.to_string();
        self.resolver.schema_path = None;
        self.resolver.validate()?;
        Ok(self)
    }

    /// Returns the resolver configuration described by this config.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            fixed_point: self.resolver.fixed_point,
            limits: self.limits.input_limits(),
            ..ResolverConfig::default()
        }
    }

    /// Loads the configured schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the schema file cannot be read, parsed, or
    /// validated, or when the built-in name is unknown.
    pub fn load_schema(&self) -> Result<Schema, ConfigError> {
        match &self.resolver.schema_path {
            Some(path) => load_schema_file(Path::new(path.trim())),
            None => builtin_schema(&self.resolver.schema).ok_or_else(|| {
                ConfigError::Invalid(format!("unknown built-in schema: {}", self.resolver.schema))
            }),
        }
    }

    /// Builds the configured resolution event sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file sink cannot be opened.
    pub fn build_sink(&self) -> Result<Box<dyn ResolutionSink>, ConfigError> {
        self.audit.build_sink()
    }
}

// ============================================================================
// SECTION: Resolver Section
// ============================================================================

/// Schema selection and fixed-point verification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSection {
    /// Built-in schema name. Ignored when `schema_path` is set.
    #[serde(default = "default_schema_name")]
    pub schema: String,
    /// Optional JSON schema file.
    #[serde(default)]
    pub schema_path: Option<String>,
    /// Fixed-point verification mode.
    #[serde(default)]
    pub fixed_point: FixedPointMode,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            schema: default_schema_name(),
            schema_path: None,
            fixed_point: FixedPointMode::default(),
        }
    }
}

impl ResolverSection {
    /// Validates schema selection.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.schema_path {
            return validate_path_string("resolver.schema_path", path);
        }
        let name = self.schema.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("resolver.schema must be non-empty".to_string()));
        }
        if name.len() > MAX_SCHEMA_NAME_LENGTH {
            return Err(ConfigError::Invalid("resolver.schema exceeds max length".to_string()));
        }
        if name != self.schema {
            return Err(ConfigError::Invalid("resolver.schema must be trimmed".to_string()));
        }
        if !is_builtin_schema(name) {
            return Err(ConfigError::Invalid(format!(
                "resolver.schema must be one of: {}",
                BUILTIN_SCHEMAS.join(", ")
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Limits Section
// ============================================================================

/// Raw input limits applied before decoding.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitsSection {
    /// Maximum number of key/value pairs accepted.
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,
    /// Maximum byte length of a single value.
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_pairs: default_max_pairs(),
            max_value_bytes: default_max_value_bytes(),
        }
    }
}

impl LimitsSection {
    /// Validates limit bounds.
    fn validate(self) -> Result<(), ConfigError> {
        if self.max_pairs == 0 || self.max_pairs > MAX_INPUT_PAIRS {
            return Err(ConfigError::Invalid(format!(
                "limits.max_pairs must be between 1 and {MAX_INPUT_PAIRS}"
            )));
        }
        if self.max_value_bytes == 0 || self.max_value_bytes > MAX_INPUT_VALUE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "limits.max_value_bytes must be between 1 and {MAX_INPUT_VALUE_BYTES}"
            )));
        }
        Ok(())
    }

    /// Converts the section into engine input limits.
    #[must_use]
    pub const fn input_limits(self) -> InputLimits {
        InputLimits {
            max_pairs: self.max_pairs,
            max_value_bytes: self.max_value_bytes,
        }
    }
}

// ============================================================================
// SECTION: Audit Section
// ============================================================================

/// Destination for resolution events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
}

/// Resolution event sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditSection {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// JSON lines path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditSection {
    /// Validates sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Builds the sink described by this section.
    fn build_sink(&self) -> Result<Box<dyn ResolutionSink>, ConfigError> {
        match self.sink {
            AuditSinkKind::None => Ok(Box::new(NoopResolutionSink)),
            AuditSinkKind::Stderr => Ok(Box::new(StderrResolutionSink)),
            AuditSinkKind::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for the file sink".to_string())
                })?;
                let sink = FileResolutionSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Box::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Reads, parses, and validates a JSON schema file.
fn load_schema_file(path: &Path) -> Result<Schema, ConfigError> {
    validate_path(path)?;
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_SCHEMA_FILE_SIZE {
        return Err(ConfigError::Invalid("schema file exceeds size limit".to_string()));
    }
    let schema: Schema = serde_json::from_slice(&bytes)
        .map_err(|err| ConfigError::Parse(format!("schema file: {err}")))?;
    schema.validate().map_err(|err| ConfigError::Invalid(format!("schema file: {err}")))?;
    Ok(schema)
}

/// Default built-in schema name.
fn default_schema_name() -> String {
    explorer::SCHEMA_ID.to_string()
}

/// Default maximum number of raw pairs.
const fn default_max_pairs() -> usize {
    DEFAULT_MAX_PAIRS
}

/// Default maximum raw value length.
const fn default_max_value_bytes() -> usize {
    DEFAULT_MAX_VALUE_BYTES
}
