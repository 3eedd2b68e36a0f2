// fraglog - platform/config.rs
//
// Platform-specific config directory resolution and config.toml loading
// with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Default location of config.toml, or `None` if the platform has no
/// config directory.
pub fn default_config_path() -> Option<PathBuf> {
    match ProjectDirs::from("", "", constants::APP_ID) {
        Some(dirs) => {
            let path = dirs.config_dir().join(constants::CONFIG_FILE_NAME);
            tracing::debug!(path = %path.display(), "Config path resolved");
            Some(path)
        }
        None => {
            tracing::warn!("Could not determine platform config directory");
            None
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[classifier]` section.
    pub classifier: ClassifierSection,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// File every record is appended to, on top of stdout.
    pub file: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// `[classifier]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    /// Speakers to ignore in addition to the built-in blacklist.
    pub extra_blacklist: Option<Vec<String>>,
}

/// Validated configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Tee file path.
    pub output_file: Option<PathBuf>,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Extra speaker blacklist entries.
    pub extra_blacklist: Vec<String>,
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning.
///
/// Called before logging is initialised (the file can set the level), so
/// problems are reported through the returned warnings only.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            };
            warnings.push(format!("{err}. Using defaults."));
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            };
            warnings.push(format!("{err}. Using defaults."));
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = AppConfig::default();

    // -- Output: file --
    if let Some(ref file) = raw.output.file {
        if !file.trim().is_empty() {
            config.output_file = Some(PathBuf::from(file));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            let err = ConfigError::ValueOutOfRange {
                field: "[logging] level".to_string(),
                value: level.clone(),
                expected: constants::VALID_LOG_LEVELS.join(", "),
            };
            warnings.push(format!("{err}. Using default ({}).", constants::DEFAULT_LOG_LEVEL));
        }
    }

    // -- Classifier: extra_blacklist --
    if let Some(extra) = raw.classifier.extra_blacklist {
        if extra.len() <= constants::MAX_EXTRA_BLACKLIST_ENTRIES {
            config.extra_blacklist = extra;
        } else {
            let err = ConfigError::ValueOutOfRange {
                field: "[classifier] extra_blacklist".to_string(),
                value: format!("{} entries", extra.len()),
                expected: format!("at most {}", constants::MAX_EXTRA_BLACKLIST_ENTRIES),
            };
            warnings.push(format!("{err}. Ignoring extra entries."));
        }
    }

    (config, warnings)
}
