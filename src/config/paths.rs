//! Project path resolution
//!
//! Locates the entry module, HTML template, public and output directories,
//! and works out the public URL prefix assets are served under.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{Config, Env, Mode};

/// Origin used to pull the pathname out of relative public URLs
const STUB_ORIGIN: &str = "https://epacker.invalid";

/// Entry module candidates, tried in order
const ENTRY_EXTENSIONS: [&str; 4] = ["js", "ts", "tsx", "jsx"];

/// Files that may declare `compilerOptions.paths`
const ALIAS_SOURCES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

/// Absolute paths for a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub app_src: PathBuf,
    pub app_index: PathBuf,
    pub app_html: PathBuf,
    pub app_public: PathBuf,
    pub app_build: PathBuf,
    pub app_package_json: PathBuf,
    /// Always ends with `/`
    pub public_url_or_path: String,
    pub aliases: BTreeMap<String, PathBuf>,
}

impl ProjectPaths {
    pub fn resolve(config: &Config, mode: Mode, env: &Env) -> Result<Self> {
        let root = config.root.clone();
        let app_src = root.join("src");
        let app_package_json = root.join("package.json");

        let homepage = read_homepage(&app_package_json)?;
        let public_url_or_path =
            public_url_or_path(mode, homepage.as_deref(), env.public_url());

        let mut aliases = BTreeMap::new();
        for file in ALIAS_SOURCES {
            aliases.extend(read_path_aliases(&root, &root.join(file)));
        }
        for (alias, target) in &config.resolve.alias {
            aliases.insert(alias.clone(), root.join(target));
        }

        let paths = Self {
            app_index: resolve_entry(&app_src),
            app_html: root.join("public").join("index.html"),
            app_public: root.join("public"),
            app_build: config.output_dir(),
            app_src,
            app_package_json,
            public_url_or_path,
            aliases,
            root,
        };

        debug!("Resolved project paths: {:?}", paths);

        Ok(paths)
    }
}

/// Pick the first existing `src/index.*`, defaulting to `index.js`
fn resolve_entry(app_src: &Path) -> PathBuf {
    for ext in ENTRY_EXTENSIONS {
        let candidate = app_src.join(format!("index.{}", ext));
        if candidate.is_file() {
            return candidate;
        }
    }

    let fallback = app_src.join("index.js");
    warn!("No entry module found, expecting {}", fallback.display());
    fallback
}

fn read_homepage(package_json: &Path) -> Result<Option<String>> {
    if !package_json.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(package_json)
        .with_context(|| format!("Failed to read {}", package_json.display()))?;
    let pkg: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", package_json.display()))?;

    Ok(pkg
        .get("homepage")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

/// Read `compilerOptions.paths` wildcard aliases, e.g. `"@/*": ["src/*"]`.
///
/// tsconfig files often carry comments; anything that is not plain JSON is
/// skipped with a warning rather than failing the build.
fn read_path_aliases(root: &Path, file: &Path) -> BTreeMap<String, PathBuf> {
    let mut aliases = BTreeMap::new();

    let Ok(content) = fs::read_to_string(file) else {
        return aliases;
    };

    let parsed: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring aliases in {}: {}", file.display(), e);
            return aliases;
        }
    };

    let Some(options) = parsed.get("compilerOptions") else {
        return aliases;
    };

    let base = options
        .get("baseUrl")
        .and_then(Value::as_str)
        .map(|base| root.join(base))
        .unwrap_or_else(|| root.to_path_buf());

    let Some(paths) = options.get("paths").and_then(Value::as_object) else {
        return aliases;
    };

    for (pattern, targets) in paths {
        let alias = pattern.trim_end_matches("/*");
        if alias.is_empty() || alias == "*" {
            continue;
        }

        let Some(target) = targets
            .as_array()
            .and_then(|t| t.first())
            .and_then(Value::as_str)
        else {
            continue;
        };

        let target = target.trim_end_matches("/*").trim_end_matches('*');
        aliases.insert(alias.to_string(), base.join(target));
    }

    aliases
}

/// Compute the URL prefix the app is served under.
///
/// `PUBLIC_URL` wins over the `homepage` field; the result always ends in
/// `/`. Development always serves from a path, never a full URL.
pub fn public_url_or_path(
    mode: Mode,
    homepage: Option<&str>,
    env_public_url: Option<&str>,
) -> String {
    if let Some(public_url) = env_public_url {
        let public_url = with_trailing_slash(public_url);
        return match mode {
            Mode::Development if public_url.starts_with('.') => "/".to_string(),
            Mode::Development => pathname(&public_url),
            Mode::Production => public_url,
        };
    }

    if let Some(homepage) = homepage {
        let homepage = with_trailing_slash(homepage);
        if homepage.starts_with('.') {
            return match mode {
                Mode::Development => "/".to_string(),
                Mode::Production => homepage,
            };
        }
        return pathname(&homepage);
    }

    "/".to_string()
}

fn with_trailing_slash(value: &str) -> String {
    if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    }
}

fn pathname(value: &str) -> String {
    Url::parse(STUB_ORIGIN)
        .and_then(|base| base.join(value))
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| "/".to_string())
}
