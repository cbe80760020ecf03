//! TOML-based configuration.
//!
//! Example configuration:
//! ```toml
//! [model]
//! path = "./models"
//!
//! [generator]
//! default_limit = 100
//! max_joins = 10
//!
//! [metadata]
//! snapshot = "${METADATA_SNAPSHOT_PATH}"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// `${VAR}` or `$VAR` occurrences in config values.
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

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
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Semantic model repository.
    pub model: ModelSettings,

    /// SQL generation knobs.
    pub generator: GeneratorSettings,

    /// Metadata source.
    pub metadata: MetadataSettings,
}

/// Model repository configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory scanned recursively for model and view files.
    pub path: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./models"),
        }
    }
}

/// SQL generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Row limit applied when the request names none.
    pub default_limit: u32,

    /// Cap on joined views per query.
    pub max_joins: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_joins: 10,
        }
    }
}

/// Metadata source configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Path to a JSON metadata snapshot (supports ${ENV_VAR} expansion).
    pub snapshot: Option<String>,
}

impl MetadataSettings {
    /// Snapshot path with environment variables expanded.
    pub fn resolved_snapshot(&self) -> Result<Option<PathBuf>, SettingsError> {
        match &self.snapshot {
            Some(raw) => Ok(Some(PathBuf::from(expand_env_vars(raw)?))),
            None => Ok(None),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `GROUNDSQL_CONFIG`
    /// 2. `./groundsql.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("GROUNDSQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("groundsql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A missing variable is an error
/// rather than an empty substitution.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut missing = None;

    let expanded = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                if missing.is_none() {
                    missing = Some(name.to_string());
                }
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}
