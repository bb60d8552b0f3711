use crate::error::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "deckpack.json";

/// How archive members are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    #[default]
    Deflated,
    Stored,
}

impl ArchiveCompression {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveCompression::Deflated => "deflated",
            ArchiveCompression::Stored => "stored",
        }
    }

    pub fn zip_method(self) -> zip::CompressionMethod {
        match self {
            ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
            ArchiveCompression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Packaging configuration, stored in deckpack.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackConfig {
    /// Scan field values for malformed HTML and report warnings
    #[serde(default = "default_check_html")]
    pub check_html: bool,

    /// Compression used for archive members
    #[serde(default)]
    pub compression: ArchiveCompression,
}

fn default_check_html() -> bool {
    true
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            check_html: default_check_html(),
            compression: ArchiveCompression::default(),
        }
    }
}

impl PackConfig {
    pub const KEYS: [&'static str; 2] = ["check_html", "compression"];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DeckError::Io)?;
        let config: PackConfig =
            serde_json::from_str(&content).map_err(DeckError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DeckError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(DeckError::Serialization)?;
        fs::write(config_path, content).map_err(DeckError::Io)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "check_html" => Some(self.check_html.to_string()),
            "compression" => Some(self.compression.as_str().to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "check_html" => {
                self.check_html = match value {
                    "true" | "yes" | "on" => true,
                    "false" | "no" | "off" => false,
                    other => {
                        return Err(DeckError::Config(format!(
                            "check_html expects true or false, got '{}'",
                            other
                        )))
                    }
                };
            }
            "compression" => {
                self.compression = match value {
                    "deflated" => ArchiveCompression::Deflated,
                    "stored" => ArchiveCompression::Stored,
                    other => {
                        return Err(DeckError::Config(format!(
                            "compression expects deflated or stored, got '{}'",
                            other
                        )))
                    }
                };
            }
            other => return Err(DeckError::Config(format!("Unknown config key: {}", other))),
        }
        Ok(())
    }
}
