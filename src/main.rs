//! Epacker - a zero-config front end for the webpack bundler and dev server
//!
//! Builds the bundler and dev server configuration for a project, then hands
//! it to the external tool.
//!
//! # Commands
//! - `epacker start`: dev server with hot module replacement
//! - `epacker build`: optimised production build
//!
//! The process exits 0 when the tool succeeds and 1 on any failure.

use std::process::ExitCode;

use clap::Parser;
use epacker_lib::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("epacker=debug,epacker_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("epacker=info,epacker_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await.into()
}
