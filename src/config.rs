//! Global configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Smallest usable receive buffer: one content byte, `\n`, and the reserved byte.
pub const MIN_MESSAGE_BYTES: usize = 3;

/// Local channel shared by the agent and the model.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ChannelConfig {
    /// Well-known endpoint name (named pipe / Unix socket identifier).
    #[serde(default = "default_channel_name")]
    pub name: String,
    /// Receive buffer size; one byte is reserved, the rest holds one record.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// How long to wait for the model to connect; 0 means no timeout.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    /// How long a single write or read may take; 0 means no timeout.
    #[serde(default = "default_io_timeout_seconds")]
    pub io_timeout_seconds: u64,
}

fn default_channel_name() -> String {
    "AgentServer".into()
}

fn default_max_message_bytes() -> usize {
    4096
}

fn default_connect_timeout_seconds() -> u64 {
    30
}

fn default_io_timeout_seconds() -> u64 {
    30
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            max_message_bytes: default_max_message_bytes(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            io_timeout_seconds: default_io_timeout_seconds(),
        }
    }
}

/// Model process launch settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ModelConfig {
    /// Executable used by debug builds, relative to the working directory.
    #[serde(default = "default_debug_executable")]
    pub debug_executable: PathBuf,
    /// Executable used by release builds, relative to the working directory.
    #[serde(default = "default_release_executable")]
    pub release_executable: PathBuf,
    /// Arguments passed to the model; empty by default.
    #[serde(default)]
    pub args: Vec<String>,
    /// Seconds to wait for the model to exit on stop before killing it; 0 waits forever.
    #[serde(default)]
    pub shutdown_grace_seconds: u64,
}

fn default_debug_executable() -> PathBuf {
    PathBuf::from("model-service/bin/debug/model-service")
}

fn default_release_executable() -> PathBuf {
    PathBuf::from("model-service/bin/release/model-service")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            debug_executable: default_debug_executable(),
            release_executable: default_release_executable(),
            args: Vec::new(),
            shutdown_grace_seconds: 0,
        }
    }
}

/// Global configuration parsed from `model-link.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Channel identity, size limit, and timeouts.
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Model executable and shutdown behavior.
    #[serde(default)]
    pub model: ModelConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Connect-wait bound, or `None` to wait indefinitely.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_seconds(self.channel.connect_timeout_seconds)
    }

    /// Per-write and per-read bound, or `None` to wait indefinitely.
    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        non_zero_seconds(self.channel.io_timeout_seconds)
    }

    /// Grace period before a stopping model is killed, or `None` to wait for it.
    #[must_use]
    pub fn shutdown_grace(&self) -> Option<Duration> {
        non_zero_seconds(self.model.shutdown_grace_seconds)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a blank channel name, a message limit
    /// below [`MIN_MESSAGE_BYTES`], or an empty executable path.
    pub fn validate(&self) -> Result<()> {
        if self.channel.name.trim().is_empty() {
            return Err(AppError::Config("channel.name must not be empty".into()));
        }

        if self.channel.max_message_bytes < MIN_MESSAGE_BYTES {
            return Err(AppError::Config(format!(
                "channel.max_message_bytes must be at least {MIN_MESSAGE_BYTES}"
            )));
        }

        if self.model.debug_executable.as_os_str().is_empty()
            || self.model.release_executable.as_os_str().is_empty()
        {
            return Err(AppError::Config(
                "model executables must not be empty".into(),
            ));
        }

        Ok(())
    }
}

fn non_zero_seconds(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}
