//! Build configuration
//!
//! Turns a project, a mode and the environment into the declarative config
//! the external bundler runs from. One builder serves both option variants;
//! see [`Variant`].

mod module;
mod output;
mod plugins;
mod rules;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::{Config, Env, Mode, ProjectPaths, Variant};
use crate::server::{DevServerConfig, WatchOptions};

pub use module::{render_config_module, REGEXP_KEY};
pub use output::{is_hashed, render_filename, OutputNaming, MEDIA_FILENAME};
pub use plugins::{plugins, PluginSpec};
pub use rules::{LoaderSpec, RuleSet, TransformRule};

/// Resolution order for extensionless imports
const RESOLVE_EXTENSIONS: [&str; 5] = [".js", ".ts", ".tsx", ".json", ".jsx"];

/// Everything a config builder reads
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub mode: Mode,
    pub config: Config,
    pub paths: ProjectPaths,
    pub env: Env,
}

impl BuildContext {
    pub fn new(config: Config, mode: Mode, env: Env) -> Result<Self> {
        let paths = ProjectPaths::resolve(&config, mode, &env)?;
        Ok(Self {
            mode,
            config,
            paths,
            env,
        })
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    /// Development always maps sources; production follows `GENERATE_SOURCEMAP`
    pub fn use_source_map(&self) -> bool {
        match self.mode {
            Mode::Development => true,
            Mode::Production => self.env.generate_sourcemap(),
        }
    }
}

/// Source map style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Devtool {
    Disabled,
    CheapModuleSourceMap,
    SourceMap,
}

impl Serialize for Devtool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Devtool::Disabled => serializer.serialize_bool(false),
            Devtool::CheapModuleSourceMap => serializer.serialize_str("cheap-module-source-map"),
            Devtool::SourceMap => serializer.serialize_str("source-map"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    /// Only set for production; the dev server builds in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub pathinfo: bool,
    pub filename: &'static str,
    pub chunk_filename: &'static str,
    pub public_path: String,
}

/// A Node core module polyfill, or `false` to leave it out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Fallback {
    Module(&'static str),
    Disabled(bool),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveSpec {
    pub alias: BTreeMap<String, PathBuf>,
    pub extensions: Vec<&'static str>,
    pub fallback: BTreeMap<&'static str, Fallback>,
}

/// Loader rules, wrapped in the bundler's single `oneOf` group
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    pub strict_export_presence: bool,
    pub rules: RuleSet,
}

#[derive(Serialize)]
struct OneOf<'a> {
    #[serde(rename = "oneOf")]
    one_of: &'a RuleSet,
}

impl Serialize for ModuleSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModuleSpec", 2)?;
        state.serialize_field("strictExportPresence", &self.strict_export_presence)?;
        state.serialize_field("rules", &[OneOf { one_of: &self.rules }])?;
        state.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSpec {
    pub minimize: bool,
    pub used_exports: bool,
}

/// The declarative config handed to the bundler
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub mode: Mode,
    pub bail: bool,
    pub devtool: Devtool,
    pub entry: BTreeMap<String, PathBuf>,
    pub output: OutputSpec,
    pub resolve: ResolveSpec,
    pub module: ModuleSpec,
    pub plugins: Vec<PluginSpec>,
    pub optimization: OptimizationSpec,
    pub performance: bool,
    pub target: &'static str,
    /// Wrap the build in the speed-measure plugin
    pub measure_speed: bool,
    /// Watcher settings; only set alongside a dev server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_options: Option<WatchOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerConfig>,
}

impl BuildConfig {
    pub fn new(ctx: &BuildContext) -> Result<Self> {
        let mode = ctx.mode;
        let production = mode.is_production();
        let naming = OutputNaming::for_mode(mode);

        let devtool = match mode {
            Mode::Development => Devtool::CheapModuleSourceMap,
            Mode::Production if ctx.use_source_map() => Devtool::SourceMap,
            Mode::Production => Devtool::Disabled,
        };

        let fallback = BTreeMap::from([
            ("stream", Fallback::Module("stream-browserify")),
            ("crypto", Fallback::Module("crypto-browserify")),
            ("process", Fallback::Disabled(false)),
            ("buffer", Fallback::Disabled(false)),
        ]);

        let config = Self {
            mode,
            bail: production,
            devtool,
            entry: BTreeMap::from([("index".to_string(), ctx.paths.app_index.clone())]),
            output: OutputSpec {
                path: production.then(|| ctx.paths.app_build.clone()),
                pathinfo: !production,
                filename: naming.script,
                chunk_filename: naming.script_chunk,
                public_path: ctx.paths.public_url_or_path.clone(),
            },
            resolve: ResolveSpec {
                alias: ctx.paths.aliases.clone(),
                extensions: RESOLVE_EXTENSIONS.to_vec(),
                fallback,
            },
            module: ModuleSpec {
                strict_export_presence: true,
                rules: RuleSet::for_context(ctx)?,
            },
            plugins: plugins(ctx),
            optimization: OptimizationSpec {
                minimize: production,
                used_exports: production,
            },
            performance: false,
            target: if production { "browserslist" } else { "web" },
            measure_speed: ctx.variant().is_extended(),
            watch_options: None,
            dev_server: None,
        };

        debug!(
            "Built {} config with {} rules and {} plugins",
            mode,
            config.module.rules.rules().len(),
            config.plugins.len()
        );

        Ok(config)
    }

    /// Attach dev server settings; its watch ignore list moves to the
    /// bundler's top-level `watchOptions`
    pub fn with_dev_server(mut self, dev_server: DevServerConfig) -> Self {
        self.watch_options = Some(WatchOptions {
            ignored: dev_server.watch_ignore.clone(),
        });
        self.dev_server = Some(dev_server);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.module.rules
    }

    /// Write the config module at `module_path` and the JSON it loads
    /// beside it (same stem, `.json`), creating parent directories
    pub fn write_to(&self, module_path: &Path) -> Result<()> {
        if let Some(parent) = module_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json_path = module_path.with_extension("json");
        let json_name = json_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("Invalid config path {}", module_path.display()))?;

        let json = serde_json::to_string_pretty(self).context("Failed to serialize build config")?;
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        fs::write(module_path, render_config_module(&json_name))
            .with_context(|| format!("Failed to write {}", module_path.display()))?;

        debug!("Wrote build config to {}", module_path.display());
        Ok(())
    }
}
