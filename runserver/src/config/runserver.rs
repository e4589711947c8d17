//! Runserver Configuration
//!
//! The flat configuration record for one supervised drush server

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RunserverError, RunserverResult};

pub const DEFAULT_BINARY: &str = "drush";
pub const DEFAULT_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RETRIES: u32 = 10;
pub const DEFAULT_LOG_DIR: &str = "tests/_output";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunserverConfig {
    /// Executable used to launch the server, bare names are looked up on PATH
    pub binary: String,
    /// CMS root; relative paths hang off the project directory
    pub root: Option<PathBuf>,
    pub hostname: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    /// Overrides layered on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Pause between readiness attempts
    #[serde(with = "seconds")]
    pub sleep: Duration,
    /// Maximum readiness attempts
    pub retries: u32,
    /// Directory receiving the redirected stdout/stderr files
    pub log_dir: PathBuf,
    /// Time allowed after SIGINT before the server is killed
    #[serde(with = "seconds")]
    pub grace: Duration,
}

impl Default for RunserverConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            root: None,
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            env: BTreeMap::new(),
            sleep: Duration::from_secs(1),
            retries: DEFAULT_RETRIES,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            grace: Duration::from_secs(5),
        }
    }
}

impl RunserverConfig {
    /// Create a new builder
    pub fn builder() -> crate::config::builder::RunserverConfigBuilder {
        crate::config::builder::RunserverConfigBuilder::new()
    }

    /// Parse a JSON document, filling omitted fields with defaults
    pub fn from_json_str(json: &str) -> RunserverResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RunserverResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Check the record for values the server or the probe cannot use
    pub fn validate(&self) -> RunserverResult<()> {
        if self.binary.trim().is_empty() {
            return Err(RunserverError::config("binary", "must not be empty"));
        }
        if self.hostname.trim().is_empty() {
            return Err(RunserverError::config("hostname", "must not be empty"));
        }
        if self.port == 0 {
            return Err(RunserverError::config("port", "must be between 1 and 65535"));
        }
        if self.retries == 0 {
            return Err(RunserverError::config("retries", "must allow at least one attempt"));
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(RunserverError::config(
                    format!("env.{key}"),
                    "environment variable names must be non-empty and contain no '=' or NUL",
                ));
            }
        }
        if self.env.values().any(|value| value.contains('\0')) {
            return Err(RunserverError::config("env", "values must not contain NUL"));
        }
        Ok(())
    }

    /// Absolute CMS root for the given project directory
    pub fn resolve_root(&self, project_dir: &Path) -> PathBuf {
        match &self.root {
            None => project_dir.to_path_buf(),
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => project_dir.join(root),
        }
    }

    /// Log directory, anchored to the project directory when relative
    pub fn resolve_log_dir(&self, project_dir: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            project_dir.join(&self.log_dir)
        }
    }

    /// `hostname:port` as dialed by the readiness probe
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(text) => text
            .trim()
            .parse::<u16>()
            .map_err(|e| serde::de::Error::custom(format!("invalid port '{text}': {e}"))),
    }
}

/// Durations written as (possibly fractional) seconds
mod seconds {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {secs}: {e}")))
    }
}
