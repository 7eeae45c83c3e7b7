// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Telewatch daemon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Telewatch configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelewatchConfig {
    /// Daemon identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Remote account client (messaging network API) settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Match notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Daemon identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the daemon.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "telewatch".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Remote account client configuration.
///
/// Credentials for the messaging network's application API. Both fields are
/// required by real client implementations; they stay `None` in tests.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Application identifier issued by the network.
    #[serde(default)]
    pub api_id: Option<i32>,

    /// Application hash issued by the network.
    #[serde(default)]
    pub api_hash: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("telewatch").join("telewatch.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("telewatch.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Credential vault configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Base64-encoded 32-byte AES-256-GCM key. When absent a fresh key is
    /// generated at startup and logged once so the operator can persist it
    /// out-of-band; losing the key makes all stored sessions permanently
    /// unrecoverable.
    #[serde(default)]
    pub key: Option<String>,
}

/// Match notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Webhook POST timeout in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,

    /// Maximum number of characters of message body included in a
    /// notification.
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_timeout_secs: default_webhook_timeout_secs(),
            max_body_chars: default_max_body_chars(),
        }
    }
}

fn default_webhook_timeout_secs() -> u64 {
    4
}

fn default_max_body_chars() -> usize {
    1000
}
