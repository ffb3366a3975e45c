//! Configuration for the OXA tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (oxa.toml, .oxa.toml, config/oxa.toml)
//! - The user config directory
//! - Environment variables (OXA__*)
//!
//! ## Example config file (oxa.toml):
//! ```toml
//! [schema]
//! fragment_dir = "./schema"
//! artifact = "dist/oxa-schema.json"
//!
//! [compose]
//! id_base = "https://oxa.dev"
//! title = "OXA Schema"
//! version = "0.1.0"
//! root_type = "Document"
//!
//! [output]
//! pretty = "auto"
//! quiet = false
//! ```

use config_crate::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compose::ComposeOptions;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OxaConfig {
    /// Where fragments come from and where the artifact goes
    #[serde(default)]
    pub schema: SchemaSourceConfig,

    /// Values stamped into the composed schema
    #[serde(default)]
    pub compose: ComposeOptions,

    /// CLI output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Schema source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSourceConfig {
    /// Load fragments from this directory instead of the embedded set
    #[serde(default)]
    pub fragment_dir: Option<PathBuf>,

    /// Path of the published schema artifact
    #[serde(default = "default_artifact")]
    pub artifact: PathBuf,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: PrettyMode,

    /// Only report through the exit code
    #[serde(default)]
    pub quiet: bool,
}

/// When to print the human-readable report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PrettyMode {
    /// Pretty on a terminal, JSON lines otherwise
    #[default]
    Auto,
    Always,
    Never,
}

impl PrettyMode {
    /// Resolve against whether stdout is a terminal
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            Self::Auto => is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

fn default_artifact() -> PathBuf {
    PathBuf::from("dist/oxa-schema.json")
}

impl Default for SchemaSourceConfig {
    fn default() -> Self {
        Self {
            fragment_dir: None,
            artifact: default_artifact(),
        }
    }
}

impl OxaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding an explicit (required) file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["oxa.toml", ".oxa.toml", "config/oxa.toml"];
        for location in config_locations {
            builder = builder.add_source(File::new(location, FileFormat::Toml).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "oxa", "oxa") {
            let user_config = dirs.config_dir().join("oxa.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // OXA__OUTPUT__QUIET=true, OXA__SCHEMA__FRAGMENT_DIR=./schema, ...
        builder = builder.add_source(
            Environment::with_prefix("OXA")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Parse configuration from TOML text alone
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Fragment directory, resolved against the current directory
    pub fn fragment_dir(&self) -> Option<PathBuf> {
        self.schema.fragment_dir.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
