// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every violation instead of failing fast.

use thiserror::Error;

use crate::model::TelewatchConfig;

/// A single configuration problem, either from parsing or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment failed to parse or merge the configuration sources.
    #[error("{0}")]
    Parse(#[from] figment::Error),

    /// A semantic constraint was violated.
    #[error("{message}")]
    Validation { message: String },
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors.
pub fn validate_config(config: &TelewatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of trace/debug/info/warn/error, got `{}`",
                config.agent.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // api_id and api_hash come as a pair: a real remote client needs both.
    if config.remote.api_id.is_some() != config.remote.api_hash.is_some() {
        errors.push(ConfigError::Validation {
            message: "remote.api_id and remote.api_hash must be set together".to_string(),
        });
    }

    if config.notify.webhook_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "notify.webhook_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.notify.max_body_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "notify.max_body_chars must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
