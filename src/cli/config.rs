//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in a
//! config file:
//!
//! ```toml
//! # qrda-qpp.toml
//! [conversion]
//! allow_unknown_templates = false
//! skip_validation = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use qrda_qpp::converter::ConversionOptions;

/// Root configuration structure for qrda-qpp.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Configuration for the convert command.
#[derive(Debug, Default, Deserialize)]
pub struct ConversionConfig {
    /// Walk through elements carrying only unknown template ids.
    pub allow_unknown_templates: Option<bool>,

    /// Skip node validation before encoding.
    pub skip_validation: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl ConversionConfig {
    /// Resolve library options. A flag can only switch an option on; it cannot turn
    /// off an option the config file enables.
    pub fn resolve(&self, allow_unknown_templates: bool, skip_validation: bool) -> ConversionOptions {
        ConversionOptions {
            allow_unknown_templates: allow_unknown_templates
                || self.allow_unknown_templates.unwrap_or(false),
            skip_validation: skip_validation || self.skip_validation.unwrap_or(false),
        }
    }
}
