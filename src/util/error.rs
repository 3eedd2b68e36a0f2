// fraglog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all fraglog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum FraglogError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Writing an emitted record failed. Always fatal.
    Sink(SinkError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for FraglogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Sink(e) => write!(f, "Output error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for FraglogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Errors raised while handing a record to the output.
#[derive(Debug)]
pub enum SinkError {
    /// The underlying writer (stdout or the tee file) failed.
    Io { source: io::Error },

    /// The record could not be encoded as JSON.
    Json { source: serde_json::Error },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { source } => write!(f, "failed to write record: {source}"),
            Self::Json { source } => write!(f, "failed to encode record: {source}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(source: serde_json::Error) -> Self {
        // serde_json wraps writer failures; keep them classified as I/O.
        if source.is_io() {
            Self::Io {
                source: source.into(),
            }
        } else {
            Self::Json { source }
        }
    }
}

impl From<SinkError> for FraglogError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// No tee file was given on the command line or in config.toml.
    MissingOutputPath,

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::MissingOutputPath => write!(
                f,
                "File path is required. Use -p <path> or set [output] file in config.toml"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for FraglogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for fraglog results.
pub type Result<T> = std::result::Result<T, FraglogError>;
