//! TOML-based configuration for semql.
//!
//! Supports a config file (semql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! limit_ceiling = 1000
//! append_filter_fields = true
//!
//! [engines.aliases]
//! doris_prod = "mysql"
//! ck = "clickhouse"
//!
//! [catalog]
//! path = "${SEMQL_HOME}/catalog.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::corrector::DEFAULT_LIMIT_CEILING;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Compilation behaviour.
    pub compiler: CompilerSettings,

    /// Engine registry extensions.
    pub engines: EngineSettings,

    /// Where model schemas are loaded from.
    pub catalog: CatalogSettings,
}

/// Compiler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Maximum LIMIT on any generated statement.
    pub limit_ceiling: u64,

    /// Append WHERE / ORDER BY fields missing from the SELECT list.
    pub append_filter_fields: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            limit_ceiling: DEFAULT_LIMIT_CEILING,
            append_filter_fields: true,
        }
    }
}

/// Engine settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Extra database-type names, mapped to a supported engine name.
    pub aliases: HashMap<String, String>,
}

/// Catalog settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Catalog file (TOML or JSON). Supports ${ENV_VAR} expansion.
    pub path: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SEMQL_CONFIG`
    /// 2. `./semql.toml`
    /// 3. `~/.config/semql/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SEMQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("semql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("semql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.compiler.limit_ceiling == 0 {
            return Err(SettingsError::InvalidConfig(
                "compiler.limit_ceiling must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Catalog file path with environment variables expanded.
    pub fn catalog_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.catalog
            .path
            .as_deref()
            .map(|path| expand_env_vars(path).map(PathBuf::from))
            .transpose()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
