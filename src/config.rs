//! TOML configuration.
//!
//! ```toml
//! endpoint = "http://127.0.0.1:8000/analyze-chat"
//! port = 8888
//!
//! [palette]
//! fallback = "#9e9e9e"
//!
//! [palette.colors]
//! joy = "#ffd600"
//! ```
//!
//! Precedence: CLI flag > config file > built-in default.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ViewError;
use crate::palette::{EmotionPalette, Rgb};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/analyze-chat";
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaletteConfig {
    #[serde(default)]
    pub fallback: Option<Rgb>,
    #[serde(default)]
    pub colors: BTreeMap<String, Rgb>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub palette: PaletteConfig,
}

impl FileConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ViewError> {
        toml::from_str(s).map_err(|e| ViewError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ViewError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ViewError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// Fully resolved settings for one process.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub port: u16,
    pub palette: EmotionPalette,
}

impl Settings {
    /// Merge CLI overrides over the (optional) file config over defaults.
    pub fn resolve(
        file: Option<FileConfig>,
        endpoint: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ViewError> {
        let file = file.unwrap_or_default();
        let endpoint = endpoint
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        validate_endpoint(&endpoint)?;

        let palette = if file.palette.colors.is_empty() && file.palette.fallback.is_none() {
            EmotionPalette::default()
        } else {
            EmotionPalette::standard().with_overrides(file.palette.colors, file.palette.fallback)
        };

        Ok(Self {
            endpoint,
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            palette,
        })
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ViewError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| ViewError::Config(format!("invalid endpoint `{endpoint}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ViewError::Config(format!(
            "unsupported endpoint scheme `{other}`"
        ))),
    }
}
