//! File-watch ignore set

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Serialize, Serializer};

use crate::config::ProjectPaths;
use crate::utils::slash_path;

/// Paths the dev server's watcher skips.
///
/// Nothing under the source directory is ever ignored, even a nested
/// `node_modules`.
#[derive(Debug, Clone)]
pub struct WatchIgnore {
    patterns: Vec<String>,
    set: GlobSet,
    source_dir: PathBuf,
}

impl WatchIgnore {
    pub fn for_project(paths: &ProjectPaths) -> Result<Self, globset::Error> {
        let patterns = vec![
            "**/node_modules/**".to_string(),
            format!("{}/**", globset::escape(&slash_path(&paths.app_build))),
            "**/.git/**".to_string(),
        ];
        Self::new(patterns, &paths.app_src)
    }

    pub fn new(patterns: Vec<String>, source_dir: &Path) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            set: builder.build()?,
            patterns,
            source_dir: source_dir.to_path_buf(),
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if path.starts_with(&self.source_dir) {
            return false;
        }
        self.set.is_match(slash_path(path))
    }
}

impl Serialize for WatchIgnore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.patterns.serialize(serializer)
    }
}
