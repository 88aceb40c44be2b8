//! Output file naming
//!
//! Filename templates handed to the bundler, plus a local renderer for the
//! same placeholders so hashed names can be predicted and recognised.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::config::Mode;
use crate::utils::hash_content;

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(name|ext|hash|contenthash)(?::(\d+))?\]").unwrap()
});

/// `name.0123abcd.ext` or `name.0123abcd.chunk.ext`
static HASHED_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.[0-9a-f]{8}(\.chunk)?\.[A-Za-z0-9]+$").unwrap()
});

/// Emitted media files keep their name plus a short hash
pub const MEDIA_FILENAME: &str = "static/media/[name].[hash:8].[ext]";

/// Output filename templates for one build mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputNaming {
    pub script: &'static str,
    pub script_chunk: &'static str,
    /// Stylesheets are only extracted to files in production
    pub style: Option<&'static str>,
    pub style_chunk: Option<&'static str>,
    pub media: &'static str,
}

impl OutputNaming {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Development => Self {
                script: "static/js/bundle.js",
                script_chunk: "static/js/[name].chunk.js",
                style: None,
                style_chunk: None,
                media: MEDIA_FILENAME,
            },
            Mode::Production => Self {
                script: "static/js/[name].[contenthash:8].js",
                script_chunk: "static/js/[name].[contenthash:8].chunk.js",
                style: Some("static/css/[name].[contenthash:8].css"),
                style_chunk: Some("static/css/[name].[contenthash:8].chunk.css"),
                media: MEDIA_FILENAME,
            },
        }
    }

    /// Whether any script template embeds a hash
    pub fn is_content_hashed(&self) -> bool {
        PLACEHOLDER_REGEX
            .captures_iter(self.script)
            .any(|cap| matches!(&cap[1], "hash" | "contenthash"))
    }
}

/// Expand a filename template for a file with the given content.
///
/// `[hash]` and `[contenthash]` both derive from the content, so the same
/// bytes always produce the same name.
pub fn render_filename(template: &str, file: &Path, content: &[u8]) -> String {
    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let hash = hash_content(content);

    PLACEHOLDER_REGEX
        .replace_all(template, |cap: &Captures<'_>| match &cap[1] {
            "name" => name.to_string(),
            "ext" => ext.to_string(),
            _ => {
                let len = cap
                    .get(2)
                    .and_then(|m| m.as_str().parse::<usize>().ok())
                    .unwrap_or(hash.len())
                    .min(hash.len());
                hash[..len].to_string()
            }
        })
        .into_owned()
}

/// Recognise a file name produced from a hashed template
pub fn is_hashed(file_name: &str) -> bool {
    HASHED_NAME_REGEX.is_match(file_name)
}
