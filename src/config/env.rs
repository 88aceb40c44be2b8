//! Environment variables consumed by the config builders

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use super::Mode;

/// Bind address when `HOST` is unset
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Images smaller than this many bytes are inlined as data URIs
pub const DEFAULT_IMAGE_INLINE_SIZE_LIMIT: u64 = 10_000;

/// Only variables with this prefix reach client code
const CLIENT_ENV_PREFIX: &str = "REACT_APP_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Snapshot of the process environment
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build an environment from explicit pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Look up a variable; empty values count as unset
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn host(&self) -> Option<&str> {
        self.get("HOST")
    }

    pub fn port(&self) -> Result<Option<u16>, EnvError> {
        self.get("PORT")
            .map(|value| {
                value.trim().parse().map_err(|_| EnvError::Invalid {
                    name: "PORT",
                    expected: "a port number",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    /// Source maps are on unless `GENERATE_SOURCEMAP` is exactly `false`
    pub fn generate_sourcemap(&self) -> bool {
        self.get("GENERATE_SOURCEMAP") != Some("false")
    }

    pub fn image_inline_size_limit(&self) -> Result<u64, EnvError> {
        match self.get("IMAGE_INLINE_SIZE_LIMIT") {
            None => Ok(DEFAULT_IMAGE_INLINE_SIZE_LIMIT),
            Some(value) => value.trim().parse().map_err(|_| EnvError::Invalid {
                name: "IMAGE_INLINE_SIZE_LIMIT",
                expected: "a byte count",
                value: value.to_string(),
            }),
        }
    }

    pub fn public_url(&self) -> Option<&str> {
        self.get("PUBLIC_URL")
    }

    pub fn https(&self) -> bool {
        self.get("HTTPS") == Some("true")
    }

    pub fn ssl_crt_file(&self) -> Option<&str> {
        self.get("SSL_CRT_FILE")
    }

    pub fn ssl_key_file(&self) -> Option<&str> {
        self.get("SSL_KEY_FILE")
    }

    /// Variables exposed to client code through the define plugin
    pub fn client_env(&self, mode: Mode, public_url: &str) -> ClientEnv {
        let mut raw: BTreeMap<String, String> = self
            .vars
            .iter()
            .filter(|(key, _)| key.starts_with(CLIENT_ENV_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        raw.insert("NODE_ENV".to_string(), mode.as_str().to_string());
        raw.insert(
            "PUBLIC_URL".to_string(),
            public_url.trim_end_matches('/').to_string(),
        );

        ClientEnv { raw }
    }
}

/// Client-visible environment, sorted by key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEnv {
    pub raw: BTreeMap<String, String>,
}

impl ClientEnv {
    /// `process.env.KEY` → JSON string literal, as the define plugin expects
    pub fn stringified(&self) -> BTreeMap<String, String> {
        self.raw
            .iter()
            .map(|(key, value)| {
                (
                    format!("process.env.{}", key),
                    serde_json::Value::String(value.clone()).to_string(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let env = Env::default();

        assert_eq!(env.host(), None);
        assert_eq!(env.port(), Ok(None));
        assert!(env.generate_sourcemap());
        assert_eq!(env.image_inline_size_limit(), Ok(10_000));
        assert!(!env.https());
    }

    #[test]
    fn test_sourcemap_only_disabled_by_literal_false() {
        assert!(!Env::from_vars([("GENERATE_SOURCEMAP", "false")]).generate_sourcemap());
        assert!(Env::from_vars([("GENERATE_SOURCEMAP", "0")]).generate_sourcemap());
        assert!(Env::from_vars([("GENERATE_SOURCEMAP", "FALSE")]).generate_sourcemap());
        assert!(Env::from_vars([("GENERATE_SOURCEMAP", "")]).generate_sourcemap());
    }

    #[test]
    fn test_invalid_numbers() {
        let env = Env::from_vars([("IMAGE_INLINE_SIZE_LIMIT", "big"), ("PORT", "http")]);

        assert!(matches!(
            env.image_inline_size_limit(),
            Err(EnvError::Invalid { name: "IMAGE_INLINE_SIZE_LIMIT", .. })
        ));
        assert!(matches!(env.port(), Err(EnvError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn test_empty_host_is_unset() {
        assert_eq!(Env::from_vars([("HOST", "")]).host(), None);
        assert_eq!(Env::from_vars([("HOST", "127.0.0.1")]).host(), Some("127.0.0.1"));
    }

    #[test]
    fn test_client_env() {
        let env = Env::from_vars([
            ("REACT_APP_API", "https://api.test"),
            ("SECRET_TOKEN", "hidden"),
        ]);

        let client = env.client_env(Mode::Production, "/app/");
        assert_eq!(client.raw.len(), 3);
        assert!(!client.raw.contains_key("SECRET_TOKEN"));
        assert_eq!(client.raw["PUBLIC_URL"], "/app");

        let stringified = client.stringified();
        assert_eq!(stringified["process.env.NODE_ENV"], "\"production\"");
        assert_eq!(stringified["process.env.REACT_APP_API"], "\"https://api.test\"");
    }
}
