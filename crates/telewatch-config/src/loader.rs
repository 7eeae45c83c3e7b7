// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./telewatch.toml` > `~/.config/telewatch/telewatch.toml`
//! > `/etc/telewatch/telewatch.toml` with environment variable overrides via
//! `TELEWATCH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TelewatchConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/telewatch/telewatch.toml` (system-wide)
/// 3. `~/.config/telewatch/telewatch.toml` (user XDG config)
/// 4. `./telewatch.toml` (local directory)
/// 5. `TELEWATCH_*` environment variables
pub fn load_config() -> Result<TelewatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelewatchConfig::default()))
        .merge(Toml::file("/etc/telewatch/telewatch.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("telewatch/telewatch.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("telewatch.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config file specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TelewatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelewatchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TelewatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelewatchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TELEWATCH_STORAGE_DATABASE_PATH` must
/// map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TELEWATCH_").map(|key| {
        // Keys arrive in their original (upper) case; lowercase before the
        // section prefixes can match.
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("remote_", "remote.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("vault_", "vault.", 1)
            .replacen("notify_", "notify.", 1);
        mapped.into()
    })
}
