//! Development server command implementation

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use super::{config_path, tool_invocation, Cli, Prepared};
use crate::config::{Env, Mode};
use crate::dispatch::Script;
use crate::pipeline::BuildConfig;
use crate::server::DevServerConfig;

/// Write the development config and launch the dev server with it
pub(crate) fn prepare(cli: &Cli, env: Env) -> Result<Prepared> {
    let ctx = cli.load_context(Mode::Development, env)?;

    let dev_server = DevServerConfig::new(&ctx)?;
    let url = dev_server.url();
    let compress = dev_server.compress;

    let config = BuildConfig::new(&ctx)?.with_dev_server(dev_server);
    let config_file = config_path(&ctx.paths.root, Script::Start);
    config.write_to(&config_file)?;
    info!("Development config written to {}", config_file.display());

    eprintln!(
        "{} Starting dev server at {}\n",
        "→".blue(),
        url.cyan().underline()
    );
    eprintln!(
        "  {} Hot Module Replacement {}",
        "•".dimmed(),
        "enabled".green()
    );
    if compress {
        eprintln!("  {} Compression {}", "•".dimmed(), "enabled".green());
    }
    eprintln!(
        "  {} Press {} to stop\n",
        "•".dimmed(),
        "Ctrl+C".yellow()
    );

    let invocation = tool_invocation(&ctx, &ctx.config.tools.dev_server, &config_file)?;

    Ok(Prepared {
        invocation,
        report_dir: None,
    })
}
