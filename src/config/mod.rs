// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the session engine.
//!
//! This module provides:
//! - Engine settings loaded from TOML (storage, recording, performance, logging)
//! - Set files in YAML describing a set and its library entries

pub mod set_file;

pub use set_file::{SetFile, SetHeader, validate_set_file};

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Root engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.storage.signed_url_ttl_secs == 0 {
            bail!("storage.signed_url_ttl_secs must be greater than zero");
        }
        if self.recording.file_prefix.trim().is_empty() {
            bail!("recording.file_prefix must not be empty");
        }
        if self.recording.extension.trim().is_empty() {
            bail!("recording.extension must not be empty");
        }
        Ok(())
    }
}

/// Object storage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Validity of signed playback URLs
    #[serde(default = "default_ttl_secs")]
    pub signed_url_ttl_secs: u64,
    /// Cache lifetime hint for uploaded clips
    #[serde(default = "default_ttl_secs")]
    pub cache_control_secs: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

impl StorageConfig {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }

    pub fn cache_control(&self) -> Duration {
        Duration::from_secs(self.cache_control_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            signed_url_ttl_secs: default_ttl_secs(),
            cache_control_secs: default_ttl_secs(),
        }
    }
}

/// Clip recording settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingConfig {
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_file_prefix() -> String {
    "recording".to_string()
}
fn default_extension() -> String {
    "webm".to_string()
}
fn default_content_type() -> String {
    "audio/webm".to_string()
}

impl RecordingConfig {
    /// File name for a recording finished at `unix_millis`
    pub fn file_name(&self, unix_millis: u128) -> String {
        format!("{}_{}.{}", self.file_prefix, unix_millis, self.extension)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            extension: default_extension(),
            content_type: default_content_type(),
        }
    }
}

/// Performance mode settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceConfig {
    /// Start the stopwatch when a session is entered
    #[serde(default = "default_true")]
    pub auto_start_timer: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            auto_start_timer: true,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive for tracing-subscriber, overridden by RUST_LOG
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "setlist=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}
