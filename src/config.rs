//! Rendering options.
//!
//! Options come from [`RenderOptions::default`] or from a TOML file:
//!
//! ```toml
//! highlight = "Jaworski T."
//!
//! [labels]
//! volume = "vol."
//! pages = "pp."
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name emphasized in author lists unless configured otherwise.
pub const DEFAULT_HIGHLIGHT: &str = "Jaworski T.";

/// Errors that can occur when loading options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Words used inside rendered entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Labels {
    pub volume: String,
    pub number: String,
    pub pages: String,
    /// Introduces the containing book of an `incollection` entry.
    pub in_collection: String,
    /// Follows the editor list of an `incollection` entry.
    pub editor: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            volume: "tom".to_string(),
            number: "nr".to_string(),
            pages: "str.".to_string(),
            in_collection: "W:".to_string(),
            editor: "ed.".to_string(),
        }
    }
}

/// Options for [`crate::render`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Author set in bold wherever it appears, written as `Family I.`.
    pub highlight: Option<String>,
    pub labels: Labels,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight: Some(DEFAULT_HIGHLIGHT.to_string()),
            labels: Labels::default(),
        }
    }
}

/// Loads rendering options from a TOML file.
///
/// Missing keys keep their default values.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_options(path: &Path) -> Result<RenderOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_options(&content)
}

/// Parses rendering options from TOML text.
pub fn parse_options(content: &str) -> Result<RenderOptions, ConfigError> {
    Ok(toml::from_str(content)?)
}
