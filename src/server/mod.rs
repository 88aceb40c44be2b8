//! Development server configuration
//!
//! Describes how the external dev server should run:
//! - Listen address, HTTPS and compression
//! - Hot module replacement
//! - Single-page-app fallback routing
//! - Which paths the file watcher skips

mod fallback;
mod https;
mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::DEFAULT_HOST;
use crate::pipeline::BuildContext;

pub use fallback::HistoryFallback;
pub use https::{HttpsConfig, HttpsError};
pub use watch::WatchIgnore;

/// Dev server settings, attached to the build config for `start`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevServerConfig {
    pub port: u16,
    pub host: String,
    pub https: HttpsConfig,
    /// Hot module replacement
    pub hot: bool,
    pub open: bool,
    /// Gzip static responses
    pub compress: bool,
    #[serde(rename = "static")]
    pub static_files: StaticFiles,
    pub dev_middleware: DevMiddleware,
    pub client: ClientOverlay,
    pub history_api_fallback: HistoryFallback,
    /// Emitted as the bundler's top-level `watchOptions.ignored`
    #[serde(skip)]
    pub watch_ignore: WatchIgnore,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticFiles {
    pub directory: PathBuf,
    pub public_path: String,
    pub watch: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevMiddleware {
    pub public_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientOverlay {
    pub logging: &'static str,
    pub overlay: bool,
}

/// The bundler's `watchOptions`
#[derive(Debug, Clone, Serialize)]
pub struct WatchOptions {
    pub ignored: WatchIgnore,
}

impl DevServerConfig {
    /// Build the dev server settings.
    ///
    /// `PORT` and `HOST` from the environment override `[dev]` in the
    /// project file, which overrides the built-in defaults.
    pub fn new(ctx: &BuildContext) -> Result<Self> {
        let extended = ctx.variant().is_extended();
        let public_path = ctx.paths.public_url_or_path.clone();

        let port = ctx.env.port()?.unwrap_or(ctx.config.dev.port);
        let host = ctx
            .env
            .host()
            .map(str::to_string)
            .or_else(|| ctx.config.dev.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let https = HttpsConfig::from_env(&ctx.env, &ctx.paths.root, ctx.variant())?;
        let watch_ignore = WatchIgnore::for_project(&ctx.paths)
            .context("Failed to build watch ignore patterns")?;

        Ok(Self {
            port,
            host,
            https,
            hot: true,
            open: extended,
            compress: extended,
            static_files: StaticFiles {
                directory: ctx.paths.app_public.clone(),
                public_path: public_path.clone(),
                watch: true,
            },
            dev_middleware: DevMiddleware {
                public_path: public_path.trim_end_matches('/').to_string(),
            },
            client: ClientOverlay {
                logging: "none",
                overlay: false,
            },
            history_api_fallback: HistoryFallback::new(&public_path),
            watch_ignore,
        })
    }

    pub fn https_enabled(&self) -> bool {
        self.https.is_enabled()
    }

    /// Address users should open; wildcard hosts are shown as localhost
    pub fn url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "localhost",
            host => host,
        };
        format!(
            "{}://{}:{}{}",
            self.https.scheme(),
            host,
            self.port,
            self.static_files.public_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Env, Mode, Variant};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn server(variant: Variant, env: Env) -> Result<DevServerConfig> {
        let mut config = Config::default_config();
        config.root = PathBuf::from("/project");
        config.variant = variant;
        let ctx = BuildContext::new(config, Mode::Development, env)?;
        DevServerConfig::new(&ctx)
    }

    #[test]
    fn test_defaults() {
        let server = server(Variant::Extended, Env::default()).unwrap();

        assert_eq!(server.port, 8080);
        assert_eq!(server.host, "0.0.0.0");
        assert!(server.hot);
        assert!(!server.https_enabled());
        assert_eq!(server.history_api_fallback.index, "/");
        assert_eq!(server.dev_middleware.public_path, "");
        assert_eq!(server.url(), "http://localhost:8080/");
    }

    #[test]
    fn test_env_overrides() {
        let env = Env::from_vars([("HOST", "127.0.0.1"), ("PORT", "3001"), ("HTTPS", "true")]);
        let server = server(Variant::Extended, env).unwrap();

        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 3001);
        assert!(server.https_enabled());
        assert_eq!(server.url(), "https://127.0.0.1:3001/");
    }

    #[test]
    fn test_variants() {
        let extended = server(Variant::Extended, Env::default()).unwrap();
        let standard = server(Variant::Standard, Env::from_vars([("HTTPS", "true")])).unwrap();

        assert!(extended.compress && extended.open);
        assert!(!standard.compress && !standard.open);
        assert!(!standard.https_enabled());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(server(Variant::Extended, Env::from_vars([("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(server(Variant::Standard, Env::default()).unwrap()).unwrap();

        assert_eq!(value["https"], json!(false));
        assert_eq!(value["static"]["directory"], json!("/project/public"));
        assert_eq!(value["historyApiFallback"], json!({ "index": "/", "disableDotRule": false }));
        // the dev server schema has no watchOptions
        assert!(value.get("watchOptions").is_none());
        assert_eq!(value["client"], json!({ "logging": "none", "overlay": false }));
    }
}
