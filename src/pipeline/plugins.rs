//! Bundler plugin list
//!
//! Plugins are described, not executed: each entry names a plugin the
//! generated config module instantiates with the given options.

use serde::Serialize;
use serde_json::{json, Value};

use super::module::regexp;
use super::output::OutputNaming;
use super::BuildContext;

/// Plugin names and the Node expression yielding each constructor
pub(crate) const PLUGIN_CONSTRUCTORS: &[(&str, &str)] = &[
    ("html", "require('html-webpack-plugin')"),
    ("provide", "require('webpack').ProvidePlugin"),
    ("define", "require('webpack').DefinePlugin"),
    ("hot-module-replacement", "require('webpack').HotModuleReplacementPlugin"),
    ("css-extract", "require('mini-css-extract-plugin')"),
    ("externals", "require('html-webpack-externals-plugin')"),
    ("ignore", "require('webpack').IgnorePlugin"),
    ("bundle-analyzer", "require('webpack-bundle-analyzer').BundleAnalyzerPlugin"),
];

/// A plugin invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSpec {
    pub name: String,
    pub options: Value,
}

impl PluginSpec {
    pub fn new(name: &str, options: Value) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

/// Build the ordered plugin list for a context
pub fn plugins(ctx: &BuildContext) -> Vec<PluginSpec> {
    let mode = ctx.mode;
    let client_env = ctx.env.client_env(mode, &ctx.paths.public_url_or_path);
    let naming = OutputNaming::for_mode(mode);

    let mut plugins = vec![
        PluginSpec::new("html", json!({ "template": ctx.paths.app_html })),
        PluginSpec::new("provide", json!({ "buffer": "buffer", "process": "process" })),
        PluginSpec::new("define", json!(client_env.stringified())),
    ];

    if mode.is_development() {
        plugins.push(PluginSpec::new("hot-module-replacement", json!({})));
    }

    if let (Some(filename), Some(chunk_filename)) = (naming.style, naming.style_chunk) {
        plugins.push(PluginSpec::new(
            "css-extract",
            json!({ "filename": filename, "chunkFilename": chunk_filename }),
        ));
    }

    if !ctx.config.externals.is_empty() {
        plugins.push(PluginSpec::new(
            "externals",
            json!({ "externals": ctx.config.externals }),
        ));
    }

    // Drop moment.js locale bundles
    plugins.push(PluginSpec::new(
        "ignore",
        json!({
            "resourceRegExp": regexp(r"^\./locale$"),
            "contextRegExp": regexp("moment$")
        }),
    ));

    if ctx.variant().is_extended() && mode.is_production() {
        plugins.push(PluginSpec::new(
            "bundle-analyzer",
            json!({ "analyzerMode": "static", "openAnalyzer": false }),
        ));
    }

    plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Env, Mode, Variant};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn names(variant: Variant, mode: Mode) -> Vec<String> {
        let mut config = Config::default_config();
        config.root = PathBuf::from("/project");
        config.variant = variant;
        let ctx = BuildContext::new(config, mode, Env::default()).unwrap();
        plugins(&ctx).into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_development_plugins() {
        assert_eq!(
            names(Variant::Extended, Mode::Development),
            vec!["html", "provide", "define", "hot-module-replacement", "externals", "ignore"]
        );
    }

    #[test]
    fn test_production_plugins_per_variant() {
        assert_eq!(
            names(Variant::Extended, Mode::Production),
            vec!["html", "provide", "define", "css-extract", "externals", "ignore", "bundle-analyzer"]
        );
        assert_eq!(
            names(Variant::Standard, Mode::Production),
            vec!["html", "provide", "define", "css-extract", "externals", "ignore"]
        );
    }

    #[test]
    fn test_every_plugin_has_a_constructor() {
        for (variant, mode) in [
            (Variant::Extended, Mode::Development),
            (Variant::Extended, Mode::Production),
            (Variant::Standard, Mode::Production),
        ] {
            for name in names(variant, mode) {
                assert!(
                    PLUGIN_CONSTRUCTORS.iter().any(|(known, _)| *known == name),
                    "no constructor for {}",
                    name
                );
            }
        }
    }

    #[test]
    fn test_ignore_patterns_are_regexps() {
        let mut config = Config::default_config();
        config.root = PathBuf::from("/project");
        let ctx = BuildContext::new(config, Mode::Production, Env::default()).unwrap();

        let ignore = plugins(&ctx).into_iter().find(|p| p.name == "ignore").unwrap();
        assert_eq!(ignore.options["resourceRegExp"], json!({ "$regexp": r"^\./locale$" }));
        assert_eq!(ignore.options["contextRegExp"], json!({ "$regexp": "moment$" }));
    }

    #[test]
    fn test_define_carries_client_env() {
        let mut config = Config::default_config();
        config.root = PathBuf::from("/project");
        let env = Env::from_vars([("REACT_APP_FLAG", "on")]);
        let ctx = BuildContext::new(config, Mode::Production, env).unwrap();

        let define = plugins(&ctx).into_iter().find(|p| p.name == "define").unwrap();
        assert_eq!(define.options["process.env.REACT_APP_FLAG"], json!("\"on\""));
        assert_eq!(define.options["process.env.NODE_ENV"], json!("\"production\""));
    }
}
