//! Run configuration for mapper construction and decoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Strictness and decoding switches.
///
/// Every flag defaults to `false`, which is the most permissive behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Fail construction when a field has no column tag.
    pub error_if_untagged_field: bool,

    /// Fail decoder construction when a tagged header appears more than once.
    pub error_if_duplicate_headers: bool,

    /// Fail decoder construction when a tagged field has no matching header.
    pub error_if_missing_headers: bool,

    /// Leave a field at its zero value when its cell is the empty string.
    pub ignore_empty_on_decode: bool,
}

impl Options {
    /// Every strict flag on; empty cells are still decoded.
    pub fn strict() -> Self {
        Self {
            error_if_untagged_field: true,
            error_if_duplicate_headers: true,
            error_if_missing_headers: true,
            ignore_empty_on_decode: false,
        }
    }

    /// Read an options file.
    ///
    /// The format follows the file extension; a file without one is TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = match path.extension() {
            Some(ext) => ext.to_string_lossy().parse()?,
            None => Format::Toml,
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, format)
    }

    /// Parse options text. Missing keys keep their defaults.
    pub fn parse(text: &str, format: Format) -> Result<Self, ConfigError> {
        Ok(match format {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Toml => toml::from_str(text)?,
        })
    }

    /// Render every flag, defaults included.
    pub fn render(&self, format: Format) -> Result<String, ConfigError> {
        Ok(match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        })
    }
}

/// Text formats an options file can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Match a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_extension(name).ok_or_else(|| ConfigError::UnsupportedFormat(name.to_string()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        })
    }
}

/// Errors loading or rendering [`Options`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML options: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML options: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("cannot render options as TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),

    #[error("unsupported options format: {0}")]
    UnsupportedFormat(String),
}
