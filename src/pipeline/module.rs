//! JavaScript config module
//!
//! The bundler loads `--config` as a Node module, so the JSON config is
//! wrapped in a small generated module that:
//! - reads the JSON written next to it
//! - turns `{"$regexp": source}` markers back into `RegExp` values
//! - instantiates each named plugin
//! - wraps the result in the speed-measure plugin when `measureSpeed` is set

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::plugins::PLUGIN_CONSTRUCTORS;

/// Object key marking a regular expression in the JSON config
pub const REGEXP_KEY: &str = "$regexp";

const CONFIG_FILE_PLACEHOLDER: &str = "__EPACKER_CONFIG_FILE__";
const PLUGINS_PLACEHOLDER: &str = "__EPACKER_PLUGINS__";

const TEMPLATE: &str = r#"'use strict';

// Generated by epacker; rewritten on every run.
const fs = require('fs');
const path = require('path');

const REGEXP_KEY = '$regexp';

const config = JSON.parse(
  fs.readFileSync(path.join(__dirname, __EPACKER_CONFIG_FILE__), 'utf8'),
  (key, value) => {
    if (value && typeof value === 'object' && !Array.isArray(value)) {
      const keys = Object.keys(value);
      if (keys.length === 1 && keys[0] === REGEXP_KEY) {
        return new RegExp(value[REGEXP_KEY]);
      }
    }
    return value;
  }
);

const constructors = {
__EPACKER_PLUGINS__
};

config.plugins = config.plugins.map(({ name, options }) => {
  const load = constructors[name];
  if (!load) {
    throw new Error(`epacker: unknown plugin "${name}"`);
  }
  const Plugin = load();
  return new Plugin(options);
});

const measureSpeed = config.measureSpeed;
delete config.measureSpeed;

if (measureSpeed) {
  const SpeedMeasurePlugin = require('speed-measure-webpack-plugin');
  module.exports = new SpeedMeasurePlugin().wrap(config);
} else {
  module.exports = config;
}
"#;

/// A regular expression serialized as `{"$regexp": source}`
pub(crate) struct JsRegExp<'a>(pub &'a str);

impl Serialize for JsRegExp<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(REGEXP_KEY, self.0)?;
        map.end()
    }
}

/// Marker value for a regular expression inside free-form options
pub(crate) fn regexp(source: &str) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert(REGEXP_KEY.to_string(), source.into());
    serde_json::Value::Object(map)
}

/// Render the module that loads `json_file_name` from its own directory
pub fn render_config_module(json_file_name: &str) -> String {
    let constructors = PLUGIN_CONSTRUCTORS
        .iter()
        .map(|(name, module)| format!("  '{}': () => {},", name, module))
        .collect::<Vec<_>>()
        .join("\n");

    TEMPLATE
        .replace(CONFIG_FILE_PLACEHOLDER, &quote(json_file_name))
        .replace(PLUGINS_PLACEHOLDER, &constructors)
}

/// A JavaScript string literal
fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_regexp_marker() {
        assert_eq!(
            serde_json::to_value(JsRegExp(r"\.css$")).unwrap(),
            json!({ "$regexp": r"\.css$" })
        );
        assert_eq!(regexp("moment$"), json!({ "$regexp": "moment$" }));
    }

    #[test]
    fn test_module_reads_sibling_json() {
        let module = render_config_module("build.config.json");

        assert!(module.contains(r#"path.join(__dirname, "build.config.json")"#));
        assert!(module.contains("new RegExp(value[REGEXP_KEY])"));
        assert!(module.contains(&format!("const REGEXP_KEY = '{}';", REGEXP_KEY)));
        assert!(!module.contains("__EPACKER_"));
    }

    #[test]
    fn test_module_constructs_plugins() {
        let module = render_config_module("start.config.json");

        assert!(module.contains("'html': () => require('html-webpack-plugin'),"));
        assert!(module.contains("'define': () => require('webpack').DefinePlugin,"));
        assert!(module.contains("'ignore': () => require('webpack').IgnorePlugin,"));
        assert!(module.contains("return new Plugin(options);"));
    }

    #[test]
    fn test_module_strips_measure_speed() {
        let module = render_config_module("build.config.json");

        assert!(module.contains("delete config.measureSpeed;"));
        assert!(module.contains("new SpeedMeasurePlugin().wrap(config)"));
    }
}
