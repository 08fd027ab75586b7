//! Locating and reading `tidy-csharp.toml`.
//!
//! An explicit `--config` path wins. Otherwise the nearest
//! `tidy-csharp.toml` in the start directory or one of its ancestors is
//! used, and without one the built-in defaults apply.

use crate::config::rules::Options;
use crate::config::schema::{TidyConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up during discovery.
pub const CONFIG_FILE_NAME: &str = "tidy-csharp.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

/// Where the active options came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line.
    Explicit(PathBuf),
    /// Found by walking up from the start directory.
    Discovered(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => Some(path),
            ConfigSource::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(path) => write!(f, "{}", path.display()),
            ConfigSource::Discovered(path) => write!(f, "{} (discovered)", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Options together with the file they were read from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub options: Options,
    pub source: ConfigSource,
}

/// Label for messages: the file when there is one.
struct Origin<'a>(Option<&'a Path>);

impl fmt::Display for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "config {}", path.display()),
            None => f.write_str("config"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "{} is not valid TOML: {}", Origin(path.as_deref()), source)
            }
            ConfigError::Validation { path, source } => {
                write!(f, "{} rejected: {}", Origin(path.as_deref()), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

fn parse(input: &str, origin: Option<&Path>) -> Result<TidyConfig, ConfigError> {
    let owned = || origin.map(Path::to_path_buf);
    let config: TidyConfig = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: owned(),
        source,
    })?;
    config.validate().map_err(|source| ConfigError::Validation {
        path: owned(),
        source,
    })?;
    Ok(config)
}

pub fn load_from_str(input: &str) -> Result<TidyConfig, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<TidyConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

/// Nearest `tidy-csharp.toml` in `start` or its ancestors.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Resolve the options for a run started in `start`.
pub fn resolve(explicit: Option<&Path>, start: &Path) -> Result<LoadedConfig, ConfigError> {
    let source = match explicit {
        Some(path) => ConfigSource::Explicit(path.to_path_buf()),
        None => match discover(start) {
            Some(path) => ConfigSource::Discovered(path),
            None => ConfigSource::Defaults,
        },
    };
    let options = match source.path() {
        Some(path) => load_from_path(path)?.options(),
        None => Options::default(),
    };
    tracing::debug!(config = %source, rules = ?options.rules, "resolved configuration");
    Ok(LoadedConfig { options, source })
}
