//! Configuration module

use crate::options::{Options, DEFAULT_MAX_DEPTH};
use crate::policy::OneEntryPolicy;
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Extraction behavior
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Output placement settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// What to do with single-entry archives: here, wrap, ask
    pub one_entry: String,
    /// Maximum nesting depth when unpacking archives found inside archives
    pub max_depth: u32,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Spill extracted files into the current directory
    pub flat: bool,
    /// Replace an existing directory that matches the archive name
    pub overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extract: ExtractConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            one_entry: "here".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            flat: false,
            overwrite: false,
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        let shuck_dir = config_dir.join("shuck");
        if !shuck_dir.exists() {
            fs::create_dir_all(&shuck_dir)?;
        }

        Ok(shuck_dir.join("config.toml"))
    }

    /// Get default configuration content with examples
    pub fn default_config_content() -> String {
        r#"# Shuck Configuration File
# This file configures the default behavior of the shuck extractor

[extract]
# What to do when an archive holds exactly one file or directory:
#   here - place that sole entry directly in the current directory
#   wrap - keep it inside a directory named after the archive
#   ask  - prompt each time
one_entry = "here"
# Maximum nesting depth when unpacking archives found inside archives
max_depth = 32

[output]
# Spill every extracted file into the current directory instead of
# keeping the archive's own directory structure
flat = false
# Replace an existing directory whose name matches the archive
overwrite = false
"#
        .to_string()
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            // Create default config with detailed examples
            let default_content = Self::default_config_content();
            fs::write(&path, default_content)?;
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, contents)?;
        Ok(())
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Parse the configured single-entry policy, falling back to the default
    pub fn one_entry_policy(&self) -> OneEntryPolicy {
        match self.extract.one_entry.parse() {
            Ok(policy) => policy,
            Err(_) => {
                warn!(
                    "unknown one_entry value {:?} in config, using default",
                    self.extract.one_entry
                );
                OneEntryPolicy::default()
            }
        }
    }

    /// Build baseline extraction options from this configuration
    pub fn options(&self) -> Options {
        Options {
            one_entry: self.one_entry_policy(),
            max_depth: self.extract.max_depth,
            flat: self.output.flat,
            overwrite: self.output.overwrite,
            ..Options::default()
        }
    }
}
