//! Epacker library
//!
//! Config builders and process dispatch for the Epacker front end.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod pipeline;
pub mod server;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use dispatch::{Dispatcher, Outcome};
pub use pipeline::{BuildConfig, BuildContext};
pub use server::DevServerConfig;
