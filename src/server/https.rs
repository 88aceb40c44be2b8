//! HTTPS settings for the dev server

use std::path::{Path, PathBuf};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::{Env, Variant};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HttpsError {
    #[error("SSL_CRT_FILE and SSL_KEY_FILE must be set together")]
    Incomplete,

    #[error("{var} points to a missing file: {}", .path.display())]
    MissingFile { var: &'static str, path: PathBuf },
}

/// How the dev server terminates TLS
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HttpsConfig {
    #[default]
    Disabled,
    /// Let the dev server generate its own certificate
    SelfSigned,
    Certificate { cert: PathBuf, key: PathBuf },
}

impl HttpsConfig {
    /// Read `HTTPS`, `SSL_CRT_FILE` and `SSL_KEY_FILE`.
    ///
    /// Certificate paths are resolved against `root` and must exist.
    pub fn from_env(env: &Env, root: &Path, variant: Variant) -> Result<Self, HttpsError> {
        if !variant.is_extended() || !env.https() {
            return Ok(Self::Disabled);
        }

        match (env.ssl_crt_file(), env.ssl_key_file()) {
            (None, None) => Ok(Self::SelfSigned),
            (Some(cert), Some(key)) => Ok(Self::Certificate {
                cert: existing_file("SSL_CRT_FILE", root, cert)?,
                key: existing_file("SSL_KEY_FILE", root, key)?,
            }),
            _ => Err(HttpsError::Incomplete),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_enabled() {
            "https"
        } else {
            "http"
        }
    }
}

fn existing_file(var: &'static str, root: &Path, value: &str) -> Result<PathBuf, HttpsError> {
    let path = root.join(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(HttpsError::MissingFile { var, path })
    }
}

impl Serialize for HttpsConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::SelfSigned => serializer.serialize_bool(true),
            Self::Certificate { cert, key } => {
                let mut state = serializer.serialize_struct("HttpsConfig", 2)?;
                state.serialize_field("cert", cert)?;
                state.serialize_field("key", key)?;
                state.end()
            }
        }
    }
}
