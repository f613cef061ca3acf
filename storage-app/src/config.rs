// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use storage_details::ControllerConfig;

const APP_DIR: &str = "storage-details";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,

    /// Period of `Poll` calls on volume groups that need it
    pub poll_interval_ms: u64,

    pub show_jobs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LoggingLevel::Info,
            log_to_disk: true,
            poll_interval_ms: 2000,
            show_jobs: true,
        }
    }
}

impl Config {
    /// Read `path`, or the default config file when `None`.
    ///
    /// A missing file gives the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).with_context(|| format!("in {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("read {} failed", path.display())),
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(100)),
            show_jobs: self.show_jobs,
        }
    }
}

fn default_config_path() -> PathBuf {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".config"),
            None => PathBuf::from("/etc"),
        },
    };
    base.join(APP_DIR).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = Config::parse("log_level = \"debug\"\nshow_jobs = false\n").unwrap();
        assert_eq!(config.log_level, LoggingLevel::Debug);
        assert!(!config.show_jobs);
        assert!(config.log_to_disk);
        assert_eq!(config.poll_interval_ms, 2000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("log_level = 3").is_err());
        assert!(Config::parse("poll_interval_ms = \"soon\"").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("storage-details-no-such-dir/config.toml");
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn poll_interval_feeds_the_controller() {
        let config = Config {
            poll_interval_ms: 500,
            ..Default::default()
        };
        assert_eq!(config.controller().poll_interval, Duration::from_millis(500));

        let too_fast = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(too_fast.controller().poll_interval, Duration::from_millis(100));
    }
}
