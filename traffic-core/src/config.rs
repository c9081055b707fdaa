//! Pipeline configuration.
//!
//! Everything a download run needs travels in one explicit config object —
//! entity list, date bounds, directories, pacing — instead of process-wide
//! state. Loadable from a TOML file; the CLI layers its flag overrides on
//! top.

use crate::retry::RetryPolicy;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration for one download run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Entity (country/region) codes to fetch, e.g. `["US", "DE"]`.
    pub entities: Vec<String>,

    /// Inclusive range start.
    pub start: NaiveDateTime,

    /// Inclusive range end.
    pub end: NaiveDateTime,

    /// Directory for per-entity series files.
    pub output_dir: PathBuf,

    /// Directory for raw shape-failed response bodies.
    pub error_dir: PathBuf,

    /// Courtesy delay before every API request, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Total attempts per window.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (doubles per failed attempt).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }

    /// Drop malformed entity codes, returning the rejects for logging.
    pub fn retain_valid_entities(&mut self) -> Vec<String> {
        let mut rejected = Vec::new();
        self.entities.retain(|code| {
            if is_valid_entity_code(code) {
                true
            } else {
                rejected.push(code.clone());
                false
            }
        });
        rejected
    }
}

/// Entity codes are two ASCII uppercase letters (ISO 3166-1 alpha-2).
pub fn is_valid_entity_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())
}
