//! Credential resolution.
//!
//! The API token is read from the `HUGGINGFACE_API_TOKEN` environment variable
//! and, failing that, from a YAML secrets file with the same key.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the credential, both as environment variable and secrets-file key.
pub const TOKEN_KEY: &str = "HUGGINGFACE_API_TOKEN";

/// Secrets file consulted when no path is given.
pub const DEFAULT_SECRETS_FILE: &str = "secrets.yaml";

/// Key/value pairs loaded from a secrets file.
#[derive(Debug, Default, Clone)]
pub struct Secrets {
    values: BTreeMap<String, serde_yaml::Value>,
}

impl Secrets {
    /// Loads secrets from `path`.  A missing file yields no secrets.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(Error::io(
                format!("could not read {}", path.display()),
                err,
            )),
        }
    }

    /// Parses secrets from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let values: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(content)?;
        Ok(Self { values })
    }

    /// Returns the value of `key` as a string, if present and scalar.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Picks the token from `env` or, failing that, from the secrets file at
/// `path`.  Blank values count as missing.
pub fn resolve_token<P: AsRef<Path>>(env: Option<String>, path: P) -> Result<String> {
    if let Some(token) = non_blank(env) {
        return Ok(token);
    }
    let secrets = Secrets::load(path)?;
    non_blank(secrets.get(TOKEN_KEY)).ok_or_else(|| {
        Error::authentication(format!(
            "Missing API key: set {TOKEN_KEY} in the environment or the secrets file"
        ))
    })
}

/// Resolves the token from the process environment and the secrets file.
pub fn load_token<P: AsRef<Path>>(path: P) -> Result<String> {
    resolve_token(std::env::var(TOKEN_KEY).ok(), path)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
