//! Command-line interface for Epacker
//!
//! `epacker <start|build>`:
//! - `start`: dev server with hot module replacement
//! - `build`: production build
//!
//! Anything else is reported as a usage error and exits 1 without spawning.

mod build;
mod start;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use crate::config::{Config, Env, Mode, ToolConfig, CONFIG_FILE_NAME};
use crate::dispatch::{Dispatcher, Invocation, Outcome, ProcessRunner, Script, SystemRunner};
use crate::pipeline::BuildContext;
use crate::utils::format_duration;

pub use build::{Asset, AssetKind, BuildReport};

/// Where generated configs are written, relative to the project root
const CONFIG_CACHE_DIR: &str = "node_modules/.cache/epacker";

/// Epacker - a zero-config front end for the webpack bundler and dev server
#[derive(Parser, Debug)]
#[command(name = "epacker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to run: `start` or `build`
    #[arg(value_name = "COMMAND")]
    pub script: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Project file name, looked up in the project root
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    pub config: String,

    /// Project root directory
    #[arg(long, env = "EPACKER_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Write the config and print the command without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// A ready-to-run child process plus what to do once it succeeds
pub(crate) struct Prepared {
    pub(crate) invocation: Invocation,
    /// Output directory to summarise after a production build
    pub(crate) report_dir: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command against real processes
    pub async fn execute(&self) -> Outcome {
        self.execute_with(&SystemRunner, Env::from_process()).await
    }

    /// Execute the CLI command with the given runner and environment
    pub async fn execute_with<R: ProcessRunner + ?Sized>(&self, runner: &R, env: Env) -> Outcome {
        print_banner();

        let Some(arg) = self.script.as_deref() else {
            eprintln!("{} Missing command", "✗".red().bold());
            print_usage();
            return Outcome::Failure;
        };

        let script = match arg.parse::<Script>() {
            Ok(script) => script,
            Err(e) => {
                eprintln!("{} {}", "✗".red().bold(), e.to_string().red());
                print_usage();
                return Outcome::Failure;
            }
        };

        let prepared = match script {
            Script::Start => start::prepare(self, env),
            Script::Build => build::prepare(self, env),
        };

        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                eprintln!("{} {:#}", "✗".red().bold(), e);
                return Outcome::Failure;
            }
        };

        if self.dry_run {
            println!("{}", prepared.invocation.command_line());
            return Outcome::Success;
        }

        let started = Instant::now();

        match Dispatcher::new(runner).dispatch(&prepared.invocation).await {
            Ok(()) => {
                if let Some(dir) = &prepared.report_dir {
                    build::print_report(dir);
                }
                eprintln!(
                    "{} {} finished in {}\n",
                    "✓".green().bold(),
                    script,
                    format_duration(started.elapsed())
                );
                Outcome::Success
            }
            Err(e) => {
                eprintln!("{} {} failed: {}\n", "✗".red().bold(), script, e);
                Outcome::Failure
            }
        }
    }

    /// Load the project file and resolve paths for `mode`
    fn load_context(&self, mode: Mode, env: Env) -> Result<BuildContext> {
        let config = Config::discover(&self.root, &self.config)?;
        BuildContext::new(config, mode, env)
    }
}

/// Path of the generated config module for a script; its JSON sits beside it
fn config_path(root: &Path, script: Script) -> PathBuf {
    root.join(CONFIG_CACHE_DIR)
        .join(format!("{}.config.js", script))
}

/// Launch `tool` with the generated config.
///
/// Locally installed binaries in `node_modules/.bin` take precedence over
/// anything else on `PATH`.
fn tool_invocation(ctx: &BuildContext, tool: &ToolConfig, config_file: &Path) -> Result<Invocation> {
    let mode = ctx.mode.as_str();
    let invocation = Invocation::new(&tool.program, &ctx.paths.root)
        .args(tool.args.iter().cloned())
        .arg("--config")
        .arg(config_file.display().to_string())
        .env("NODE_ENV", mode)
        .env("BABEL_ENV", mode)
        .env("PATH", search_path(&ctx.paths.root, &ctx.env)?);

    debug!("Prepared invocation: {:?}", invocation);
    Ok(invocation)
}

fn search_path(root: &Path, env: &Env) -> Result<OsString> {
    let mut dirs = vec![root.join("node_modules").join(".bin")];
    if let Some(path) = env.get("PATH") {
        dirs.extend(std::env::split_paths(path));
    }
    std::env::join_paths(dirs).context("Failed to build PATH for the child process")
}

/// Print the Epacker banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "Epacker".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

fn print_usage() {
    eprintln!(
        "  Usage: {} <{}|{}>\n",
        "epacker".bold(),
        "start".cyan(),
        "build".cyan()
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::dispatch::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn cli(root: &Path, args: &[&str]) -> Cli {
        let root = root.display().to_string();
        let mut argv = vec!["epacker", "--root", root.as_str()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/index.js"), "console.log('hi')").unwrap();
        temp
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_command_spawns_nothing() {
        let temp = project();
        let runner = RecordingRunner::exiting(0);

        let outcome = cli(temp.path(), &["deploy"]).execute_with(&runner, Env::default()).await;

        assert_eq!(outcome, Outcome::Failure);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_command_fails() {
        let temp = project();
        let runner = RecordingRunner::exiting(0);

        let outcome = cli(temp.path(), &[]).execute_with(&runner, Env::default()).await;

        assert_eq!(outcome, Outcome::Failure);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_build_spawns_bundler_once() {
        let temp = project();
        let runner = RecordingRunner::exiting(0);

        let outcome = cli(temp.path(), &["build"]).execute_with(&runner, Env::default()).await;
        assert_eq!(outcome, Outcome::Success);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);

        let cache = temp.path().join("node_modules/.cache/epacker");
        let config_module = cache.join("build.config.js");
        assert_eq!(calls[0].program, "webpack");
        assert_eq!(calls[0].args, vec!["--config".to_string(), config_module.display().to_string()]);
        assert_eq!(calls[0].cwd, temp.path());
        assert!(calls[0].envs.contains(&("NODE_ENV".to_string(), "production".into())));

        let module = fs::read_to_string(&config_module).unwrap();
        assert!(module.contains(r#""build.config.json""#));
        assert!(module.contains("new RegExp("));
        assert!(module.contains("require('html-webpack-plugin')"));

        let written = read_json(&cache.join("build.config.json"));
        assert_eq!(written["mode"], "production");
        assert_eq!(written["module"]["rules"][0]["oneOf"][2]["test"][0]["$regexp"], r"\.css$");
        assert_eq!(written["plugins"][0]["name"], "html");
        assert!(written.get("devServer").is_none());
    }

    #[tokio::test]
    async fn test_start_spawns_dev_server_with_config() {
        let temp = project();
        let runner = RecordingRunner::exiting(0);

        let outcome = cli(temp.path(), &["start"]).execute_with(&runner, Env::default()).await;
        assert_eq!(outcome, Outcome::Success);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "webpack-dev-server");

        let cache = temp.path().join("node_modules/.cache/epacker");
        assert_eq!(calls[0].args[1], cache.join("start.config.js").display().to_string());

        let written = read_json(&cache.join("start.config.json"));
        assert_eq!(written["mode"], "development");
        assert!(written["watchOptions"]["ignored"].is_array());
        assert_eq!(written["devServer"]["port"], 8080);
        assert_eq!(written["devServer"]["hot"], true);
    }

    #[tokio::test]
    async fn test_child_failure_maps_to_failure() {
        let temp = project();
        let runner = RecordingRunner::exiting(2);

        let outcome = cli(temp.path(), &["build"]).execute_with(&runner, Env::default()).await;

        assert_eq!(outcome, Outcome::Failure);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_override_and_extra_args() {
        let temp = project();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[tools.bundler]\nprogram = \"node\"\nargs = [\"scripts/build.js\"]\n",
        )
        .unwrap();
        let runner = RecordingRunner::exiting(0);

        cli(temp.path(), &["build"]).execute_with(&runner, Env::default()).await;

        let calls = runner.calls();
        assert_eq!(calls[0].program, "node");
        assert_eq!(calls[0].args[0], "scripts/build.js");
        assert_eq!(calls[0].args[1], "--config");
    }

    #[tokio::test]
    async fn test_dry_run_spawns_nothing() {
        let temp = project();
        let runner = RecordingRunner::exiting(1);

        let outcome = cli(temp.path(), &["--dry-run", "build"])
            .execute_with(&runner, Env::default())
            .await;

        assert_eq!(outcome, Outcome::Success);
        assert!(runner.calls().is_empty());
        assert!(temp.path().join("node_modules/.cache/epacker/build.config.js").is_file());
        assert!(temp.path().join("node_modules/.cache/epacker/build.config.json").is_file());
    }

    #[tokio::test]
    async fn test_invalid_environment_spawns_nothing() {
        let temp = project();
        let runner = RecordingRunner::exiting(0);

        let outcome = cli(temp.path(), &["start"])
            .execute_with(&runner, Env::from_vars([("PORT", "not-a-port")]))
            .await;

        assert_eq!(outcome, Outcome::Failure);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_search_path_prefers_local_bin() {
        let env = Env::from_vars([("PATH", "/usr/bin")]);
        let path = search_path(Path::new("/project"), &env).unwrap();
        let dirs: Vec<_> = std::env::split_paths(&path).collect();

        assert_eq!(dirs[0], PathBuf::from("/project/node_modules/.bin"));
        assert_eq!(dirs[1], PathBuf::from("/usr/bin"));
    }
}
