//! Configuration schema definitions

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Build mode passed to the bundler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Mode::Development)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two option sets the generated configs follow.
///
/// `Extended` turns on gzip compression, HTTPS from the environment, opening
/// the browser, build-speed measurement and the bundle analyzer. `Standard`
/// leaves all of them off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    #[default]
    Extended,
}

impl Variant {
    pub fn is_extended(&self) -> bool {
        matches!(self, Variant::Extended)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "build".to_string()
}

/// Development server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Port to run dev server on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to; `HOST` in the environment takes precedence
    #[serde(default)]
    pub host: Option<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

/// Module resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Import aliases, values relative to the project root
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
}

/// External programs the dispatcher launches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_bundler")]
    pub bundler: ToolConfig,

    #[serde(default = "default_dev_server")]
    pub dev_server: ToolConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bundler: default_bundler(),
            dev_server: default_dev_server(),
        }
    }
}

/// A program plus any fixed arguments placed before `--config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

fn default_bundler() -> ToolConfig {
    ToolConfig::new("webpack")
}

fn default_dev_server() -> ToolConfig {
    ToolConfig::new("webpack-dev-server")
}

/// A module loaded from a CDN instead of being bundled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Import specifier, e.g. `react`
    pub module: String,

    /// Script URL injected into the HTML document
    pub entry: String,

    /// Global variable the script defines
    pub global: String,
}

pub(crate) fn default_externals() -> Vec<ExternalConfig> {
    vec![
        ExternalConfig {
            module: "react".to_string(),
            entry: "https://unpkg.com/react@17/umd/react.production.min.js".to_string(),
            global: "React".to_string(),
        },
        ExternalConfig {
            module: "react-dom".to_string(),
            entry: "https://unpkg.com/react-dom@17/umd/react-dom.production.min.js".to_string(),
            global: "ReactDOM".to_string(),
        },
    ]
}
