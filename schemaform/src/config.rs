//! Editor configuration.
//!
//! Configuration is an explicit value handed to the codec and to each editing
//! session; there is no global instance. It is usually stored as TOML:
//!
//! ```toml
//! indent_width = 2
//! initial_tab = "visual"
//! default_array_item_type = "string"
//! pretty = true
//! backup_on_write = true
//! ```
//!
//! Every key is optional. Invalid values are reported by
//! [`EditorConfig::validate`] when the configuration is built, never later.

use std::{
    fs,
    path::{Path, PathBuf},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    data::{
        codec::{MIN_INDENT, SchemaCodec},
        schema::PrimitiveType,
    },
    editor::Tab,
};

/// Largest accepted indent width.
pub const MAX_INDENT: usize = 8;

/// Settings shared by the codec, editing sessions and the file runner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Spaces per level in pretty-printed schema text (2 to 8).
    pub indent_width: usize,
    /// Tab a new session opens on.
    pub initial_tab: Tab,
    /// Element type given to new array properties.
    pub default_array_item_type: PrimitiveType,
    /// Whether raw text is pretty-printed.
    pub pretty: bool,
    /// Whether files are backed up before being overwritten.
    pub backup_on_write: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent_width: MIN_INDENT,
            initial_tab: Tab::Visual,
            default_array_item_type: PrimitiveType::String,
            pretty: true,
            backup_on_write: true,
        }
    }
}

/// Failure to build an [`EditorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML for this structure.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    /// A field holds an unsupported value.
    #[error("invalid config field `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl EditorConfig {
    /// Parse and validate TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed input and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loading editor config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_INDENT..=MAX_INDENT).contains(&self.indent_width) {
            return Err(ConfigError::Invalid {
                field: "indent_width",
                message: format!(
                    "{} is outside {MIN_INDENT}..={MAX_INDENT}",
                    self.indent_width
                ),
            });
        }
        Ok(())
    }

    /// Codec using this configuration's indent width.
    pub fn codec(&self) -> SchemaCodec {
        SchemaCodec::new(self.indent_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(
            EditorConfig::from_toml_str("").unwrap(),
            EditorConfig::default()
        );
    }

    #[test]
    fn test_partial_config() {
        let config = EditorConfig::from_toml_str(
            r#"
            indent_width = 4
            initial_tab = "raw"
            "#,
        )
        .unwrap();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.initial_tab, Tab::Raw);
        assert!(config.pretty);
    }

    #[test]
    fn test_indent_out_of_range() {
        let err = EditorConfig::from_toml_str("indent_width = 1").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "indent_width",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EditorConfig::from_toml_str("indent = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EditorConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
