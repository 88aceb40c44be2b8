//! Transform rules
//!
//! The ordered loader table handed to the bundler. Rules are evaluated
//! first-match-wins, so their order matters: images, scripts, plain
//! stylesheets, preprocessed stylesheets, and finally a catch-all for any
//! other static asset.

use std::path::{Path, PathBuf};

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use tracing::debug;

use super::module::JsRegExp;
use super::output::MEDIA_FILENAME;
use super::BuildContext;
use crate::utils::slash_path;

static IMAGE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\.bmp$", r"\.gif$", r"\.jpe?g$", r"\.png$"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static SCRIPT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(js|jsx|ts|tsx)$").unwrap());
static HTML_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.html$").unwrap());
static JSON_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.json$").unwrap());

static CSS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.css$").unwrap());
static CSS_MODULE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.module\.css$").unwrap());
static SASS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(scss|sass)$").unwrap());
static SASS_MODULE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.module\.(scss|sass)$").unwrap());
static LESS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(less)$").unwrap());
static LESS_MODULE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.module\.(less)$").unwrap());

/// Loader that pulls CSS into separate files in production builds
const CSS_EXTRACT_LOADER: &str = "mini-css-extract-plugin/loader";

/// One step in a loader chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderSpec {
    pub loader: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl LoaderSpec {
    pub fn new(loader: &str) -> Self {
        Self {
            loader: loader.to_string(),
            options: None,
        }
    }

    pub fn with_options(loader: &str, options: Value) -> Self {
        Self {
            loader: loader.to_string(),
            options: Some(options),
        }
    }
}

/// A file matcher plus the loader chain it applies
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRule {
    #[serde(skip)]
    pub name: &'static str,

    /// Empty means "any file"
    #[serde(serialize_with = "serialize_patterns", skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<Regex>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<PathBuf>,

    #[serde(serialize_with = "serialize_patterns", skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<Regex>,

    #[serde(rename = "use")]
    pub loaders: Vec<LoaderSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<bool>,
}

fn serialize_patterns<S: Serializer>(patterns: &Vec<Regex>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(patterns.iter().map(|re| JsRegExp(re.as_str())))
}

impl TransformRule {
    fn new(name: &'static str, test: Vec<Regex>, loaders: Vec<LoaderSpec>) -> Self {
        Self {
            name,
            test,
            include: None,
            exclude: Vec::new(),
            loaders,
            side_effects: None,
        }
    }

    fn include(mut self, dir: &Path) -> Self {
        self.include = Some(dir.to_path_buf());
        self
    }

    fn exclude(mut self, patterns: Vec<Regex>) -> Self {
        self.exclude = patterns;
        self
    }

    fn side_effects(mut self) -> Self {
        self.side_effects = Some(true);
        self
    }

    /// Whether this rule applies to `path`
    pub fn matches(&self, path: &Path) -> bool {
        let resource = slash_path(path);

        if !self.test.is_empty() && !self.test.iter().any(|re| re.is_match(&resource)) {
            return false;
        }

        if let Some(include) = &self.include {
            if !path.starts_with(include) {
                return false;
            }
        }

        !self.exclude.iter().any(|re| re.is_match(&resource))
    }

    /// Loader names in application order
    pub fn loader_names(&self) -> Vec<&str> {
        self.loaders.iter().map(|l| l.loader.as_str()).collect()
    }
}

/// Ordered rule list with first-match semantics
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<TransformRule>,
}

#[derive(Debug, Clone, Copy)]
enum Preprocessor {
    Sass,
    Less,
}

impl RuleSet {
    pub fn for_context(ctx: &BuildContext) -> Result<Self> {
        let image_limit = ctx.env.image_inline_size_limit()?;

        let rules = vec![
            TransformRule::new(
                "images",
                IMAGE_REGEXES.clone(),
                vec![LoaderSpec::with_options(
                    "url-loader",
                    json!({ "limit": image_limit, "name": MEDIA_FILENAME }),
                )],
            ),
            TransformRule::new("scripts", vec![SCRIPT_REGEX.clone()], vec![babel_loader()])
                .include(&ctx.paths.app_src),
            TransformRule::new("css", vec![CSS_REGEX.clone()], style_loaders(ctx, 1, None))
                .exclude(vec![CSS_MODULE_REGEX.clone()])
                .side_effects(),
            TransformRule::new(
                "sass",
                vec![SASS_REGEX.clone()],
                style_loaders(ctx, 3, Some(Preprocessor::Sass)),
            )
            .exclude(vec![SASS_MODULE_REGEX.clone()])
            .side_effects(),
            TransformRule::new(
                "less",
                vec![LESS_REGEX.clone()],
                style_loaders(ctx, 3, Some(Preprocessor::Less)),
            )
            .exclude(vec![LESS_MODULE_REGEX.clone()]),
            // Anything that fell through. Scripts, HTML and JSON are left to
            // the bundler's built-in handling.
            TransformRule::new(
                "assets",
                Vec::new(),
                vec![LoaderSpec::with_options("file-loader", json!({ "name": MEDIA_FILENAME }))],
            )
            .exclude(vec![SCRIPT_REGEX.clone(), HTML_REGEX.clone(), JSON_REGEX.clone()]),
        ];

        debug!("Built {} transform rules for {}", rules.len(), ctx.mode);

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&TransformRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// The rule the bundler will apply to `path`, if any
    pub fn match_path(&self, path: &Path) -> Option<&TransformRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }
}

fn babel_loader() -> LoaderSpec {
    LoaderSpec::with_options(
        "babel-loader",
        json!({
            "babelrc": false,
            "configFile": false,
            "compact": false,
            "presets": ["react-app"],
            "plugins": [
                ["import", { "libraryName": "antd", "libraryDirectory": "es", "style": true }],
                ["styless", {
                    "import": "~antd/lib/style/themes/default.less",
                    "lessOptions": { "javascriptEnabled": true }
                }]
            ],
            "cacheDirectory": true
        }),
    )
}

fn style_loaders(
    ctx: &BuildContext,
    import_loaders: u8,
    preprocessor: Option<Preprocessor>,
) -> Vec<LoaderSpec> {
    let source_map = ctx.use_source_map();
    let mut loaders = Vec::with_capacity(6);

    if ctx.mode.is_production() {
        let options = if ctx.paths.public_url_or_path.starts_with('.') {
            json!({ "publicPath": "../../" })
        } else {
            json!({})
        };
        loaders.push(LoaderSpec::with_options(CSS_EXTRACT_LOADER, options));
    } else {
        loaders.push(LoaderSpec::new("style-loader"));
    }

    loaders.push(LoaderSpec::with_options(
        "css-loader",
        json!({ "importLoaders": import_loaders, "sourceMap": source_map }),
    ));

    loaders.push(LoaderSpec::with_options(
        "postcss-loader",
        json!({
            "ident": "postcss",
            "plugins": [
                "postcss-flexbugs-fixes",
                ["postcss-preset-env", { "autoprefixer": { "flexbox": "no-2009" }, "stage": 3 }],
                "postcss-normalize"
            ],
            "sourceMap": source_map
        }),
    ));

    match preprocessor {
        Some(Preprocessor::Sass) => {
            loaders.push(LoaderSpec::with_options(
                "resolve-url-loader",
                json!({ "sourceMap": source_map, "root": ctx.paths.app_src }),
            ));
            loaders.push(LoaderSpec::with_options("sass-loader", json!({ "sourceMap": true })));
        }
        Some(Preprocessor::Less) => {
            loaders.push(LoaderSpec::with_options(
                "less-loader",
                json!({ "javascriptEnabled": true }),
            ));
        }
        None => {}
    }

    loaders
}
