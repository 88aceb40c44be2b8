//! Build command implementation

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{config_path, tool_invocation, Cli, Prepared};
use crate::config::{Env, Mode};
use crate::dispatch::Script;
use crate::pipeline::{is_hashed, BuildConfig};
use crate::utils::{format_size, relative_path};

/// Write the production config and launch the bundler with it
pub(crate) fn prepare(cli: &Cli, env: Env) -> Result<Prepared> {
    let ctx = cli.load_context(Mode::Production, env)?;

    let config = BuildConfig::new(&ctx)?;
    let config_file = config_path(&ctx.paths.root, Script::Build);
    config.write_to(&config_file)?;
    info!("Production config written to {}", config_file.display());

    eprintln!(
        "{} Building {} into {}...",
        "→".blue(),
        ctx.paths.app_index.display().to_string().cyan(),
        ctx.paths.app_build.display().to_string().cyan()
    );

    let invocation = tool_invocation(&ctx, &ctx.config.tools.bundler, &config_file)?;

    Ok(Prepared {
        invocation,
        report_dir: Some(ctx.paths.app_build.clone()),
    })
}

/// Kind of emitted file, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetKind {
    Html,
    Script,
    Style,
    Media,
}

impl AssetKind {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "html" | "htm" => AssetKind::Html,
            "js" | "mjs" => AssetKind::Script,
            "css" => AssetKind::Style,
            _ => AssetKind::Media,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetKind::Html => "html",
            AssetKind::Script => "js",
            AssetKind::Style => "css",
            AssetKind::Media => "media",
        };
        f.write_str(label)
    }
}

/// A file found in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Path relative to the output directory, `/`-separated
    pub path: String,
    pub size: u64,
    pub kind: AssetKind,
    pub hashed: bool,
}

/// What a production build left on disk
#[derive(Debug, Default)]
pub struct BuildReport {
    pub assets: Vec<Asset>,
}

impl BuildReport {
    /// Scan an output directory; source maps are left out
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut assets = Vec::new();

        for entry in WalkDir::new(dir) {
            let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "map") {
                continue;
            }

            let size = entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", path.display()))?
                .len();
            let file_name = entry.file_name().to_string_lossy();

            assets.push(Asset {
                path: relative_path(dir, path).unwrap_or_else(|| file_name.to_string()),
                size,
                kind: AssetKind::from_path(path),
                hashed: is_hashed(&file_name),
            });
        }

        assets.sort_by(|a, b| a.kind.cmp(&b.kind).then(b.size.cmp(&a.size)));

        Ok(Self { assets })
    }

    pub fn count(&self, kind: AssetKind) -> usize {
        self.assets.iter().filter(|a| a.kind == kind).count()
    }

    pub fn total_size(&self) -> u64 {
        self.assets.iter().map(|a| a.size).sum()
    }

    pub fn print(&self) {
        eprintln!(
            "\n{} Emitted {} file(s), {}\n",
            "✓".green().bold(),
            self.assets.len(),
            format_size(self.total_size())
        );

        for asset in &self.assets {
            let label = format!("{:<5}", asset.kind.to_string());
            let marker = if asset.hashed { "#".green() } else { " ".normal() };
            eprintln!(
                "  {} {} {} {}",
                label.dimmed(),
                marker,
                asset.path.cyan(),
                format_size(asset.size).dimmed()
            );
        }

        eprintln!();
    }
}

/// Summarise the output directory after a successful build
pub(crate) fn print_report(dir: &Path) {
    if !dir.is_dir() {
        warn!("Output directory {} was not created", dir.display());
        return;
    }

    match BuildReport::scan(dir) {
        Ok(report) => report.print(),
        Err(e) => warn!("Could not summarise build output: {:#}", e),
    }
}
