// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Telewatch monitoring daemon.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Telewatch crates.
///
/// The first group of variants is the login taxonomy surfaced to the command
/// front end; the second group covers infrastructure failures. Note that
/// "two-factor password required" is deliberately NOT an error -- it is a
/// normal state transition modeled by [`crate::types::LoginOutcome`].
#[derive(Debug, Error)]
pub enum TelewatchError {
    /// The remote network rejected the phone number.
    #[error("phone number rejected by the network")]
    InvalidPhoneFormat,

    /// An operation required a pending login attempt, but none exists.
    #[error("no login attempt in progress")]
    NoPendingLogin,

    /// The pending attempt has no recorded code hash; the one-time code
    /// cannot be validated without it.
    #[error("no code hash recorded for this attempt")]
    MissingCodeHash,

    /// The remote network rejected the one-time code.
    #[error("one-time code rejected")]
    InvalidCode,

    /// The one-time code expired before it was confirmed.
    #[error("one-time code expired")]
    CodeExpired,

    /// The two-factor password was rejected; `detail` carries the remote
    /// client's reason verbatim.
    #[error("password rejected: {detail}")]
    PasswordRejected { detail: String },

    /// The remote network is rate limiting this account.
    #[error("rate limited, retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// A newer login attempt replaced the one this operation was confirming.
    #[error("login attempt superseded by a newer one")]
    Superseded,

    /// A stored credential blob failed to decrypt -- wrong key or tampered
    /// ciphertext. Surfaced distinctly so the operator can tell "key
    /// rotated/lost" apart from "never logged in".
    #[error("stored credential failed to decrypt (wrong key or corrupted data)")]
    CorruptCredential,

    /// Configuration errors (invalid TOML, malformed filter pattern, bad key).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote account client errors that are not part of the login taxonomy
    /// (transport failures, stream errors).
    #[error("remote client error: {message}")]
    Remote {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TelewatchError {
    /// Shorthand for a remote error with no underlying source.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            source: None,
        }
    }
}
