//! Configuration handling for Epacker
//!
//! Parses the optional `epacker.toml` project file and resolves the
//! environment and filesystem inputs the config builders consume.

mod env;
mod paths;
mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use env::{ClientEnv, Env, EnvError, DEFAULT_HOST, DEFAULT_IMAGE_INLINE_SIZE_LIMIT};
pub use paths::{public_url_or_path, ProjectPaths};
pub use schema::*;

/// Default project file name, looked up in the project root
pub const CONFIG_FILE_NAME: &str = "epacker.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Option set the generated configs follow
    #[serde(default)]
    pub variant: Variant,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Development server settings
    #[serde(default)]
    pub dev: DevConfig,

    /// Module resolution settings
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// External programs
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Modules served from a CDN
    #[serde(default = "default_externals")]
    pub externals: Vec<ExternalConfig>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", canonical_path.display()))?;

        // Set root directory to the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;

        Ok(config)
    }

    /// Load `file` from `root` if it exists, otherwise fall back to defaults
    pub fn discover<P: AsRef<Path>>(root: P, file: &str) -> Result<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };

        let path = root.join(file);
        if path.is_file() {
            debug!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        debug!("No {} in {}, using defaults", file, root.display());
        let mut config = Self::default_config();
        config.root = root;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            variant: Variant::default(),
            output: OutputConfig::default(),
            dev: DevConfig::default(),
            resolve: ResolveConfig::default(),
            tools: ToolsConfig::default(),
            externals: default_externals(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.output.dir.trim().is_empty() {
            anyhow::bail!("[output] dir must not be empty");
        }

        for (name, tool) in [("bundler", &self.tools.bundler), ("dev_server", &self.tools.dev_server)] {
            if tool.program.trim().is_empty() {
                anyhow::bail!("[tools.{}] program must not be empty", name);
            }
        }

        for external in &self.externals {
            if external.module.is_empty() || external.entry.is_empty() || external.global.is_empty() {
                anyhow::bail!(
                    "External '{}' needs module, entry and global set",
                    external.module
                );
            }
        }

        Ok(())
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }
}
