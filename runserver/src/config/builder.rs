//! Runserver Configuration Builder
//!
//! Provides a fluent builder for constructing runserver configurations

use super::RunserverConfig;
use std::path::PathBuf;
use std::time::Duration;

pub struct RunserverConfigBuilder {
    config: RunserverConfig,
}

impl RunserverConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunserverConfig::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from a file
    pub fn from_config(config: RunserverConfig) -> Self {
        Self { config }
    }

    /// Set the server executable
    pub fn binary<S: Into<String>>(mut self, binary: S) -> Self {
        self.config.binary = binary.into();
        self
    }

    /// Set the CMS root directory
    pub fn root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.config.root = Some(root.into());
        self
    }

    /// Set the bind/probe hostname
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.config.hostname = hostname.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Add a single environment override
    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.config.env.insert(key.into(), value.into());
        self
    }

    /// Set the pause between readiness attempts
    pub fn sleep(mut self, sleep: Duration) -> Self {
        self.config.sleep = sleep;
        self
    }

    /// Set the maximum number of readiness attempts
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the directory receiving server output
    pub fn log_dir<P: Into<PathBuf>>(mut self, log_dir: P) -> Self {
        self.config.log_dir = log_dir.into();
        self
    }

    /// Set the interrupt grace period
    pub fn grace(mut self, grace: Duration) -> Self {
        self.config.grace = grace;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RunserverConfig {
        self.config
    }
}

impl Default for RunserverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
