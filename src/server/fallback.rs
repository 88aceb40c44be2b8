//! Single-page-app fallback routing

use serde::Serialize;

use crate::utils::clean_path;

/// Routes unmatched client-side paths to the index document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFallback {
    /// Document served for client-side routes
    pub index: String,

    /// When false, paths whose last segment has an extension are left alone
    pub disable_dot_rule: bool,
}

impl HistoryFallback {
    pub fn new(public_path: &str) -> Self {
        Self {
            index: public_path.to_string(),
            disable_dot_rule: false,
        }
    }

    /// The path a GET for `request_path` should be served from, if rewritten
    pub fn rewrite(&self, request_path: &str) -> Option<&str> {
        let path = request_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path = clean_path(path);

        if path == clean_path(&self.index) {
            return None;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        if !self.disable_dot_rule && last_segment.contains('.') {
            return None;
        }

        Some(self.index.as_str())
    }
}
