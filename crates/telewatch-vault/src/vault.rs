// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The credential vault: encrypts session blobs before they reach storage.
//!
//! Blobs are self-framing: `nonce (12 bytes) || ciphertext+tag`, so a single
//! BLOB column holds everything needed to decrypt. The process-wide key is
//! loaded from configuration at startup; if absent, a fresh key is generated
//! and logged once so the operator can persist it out-of-band. Key loss
//! makes all stored sessions permanently unrecoverable -- that is a
//! documented failure mode, not a bug.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use telewatch_config::model::VaultConfig;
use telewatch_core::TelewatchError;
use tracing::warn;
use zeroize::Zeroizing;

use crate::crypto;

const NONCE_LEN: usize = 12;

/// Process-wide symmetric vault for opaque connection/session blobs.
///
/// Debug output intentionally omits the key.
pub struct CredentialVault {
    /// The symmetric key -- only in memory, never persisted by this crate.
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialVault {
    /// Build a vault from configuration.
    ///
    /// When `vault.key` is set it must be base64 of exactly 32 bytes. When
    /// absent, a fresh key is generated and emitted at WARN level for the
    /// operator to persist.
    pub fn from_config(config: &VaultConfig) -> Result<Self, TelewatchError> {
        match &config.key {
            Some(encoded) => {
                let raw = BASE64.decode(encoded.trim()).map_err(|e| {
                    TelewatchError::Config(format!("vault.key is not valid base64: {e}"))
                })?;
                let key: [u8; 32] = raw.try_into().map_err(|_| {
                    TelewatchError::Config("vault.key must decode to exactly 32 bytes".to_string())
                })?;
                Ok(Self::from_key(key))
            }
            None => {
                let key = crypto::generate_random_key()?;
                warn!(
                    key = %BASE64.encode(key),
                    "no vault key configured; generated a fresh one -- persist it as \
                     TELEWATCH_VAULT_KEY or stored sessions will be unrecoverable after restart"
                );
                Ok(Self::from_key(key))
            }
        }
    }

    /// Build a vault from raw key bytes.
    pub fn from_key(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Encrypt a plaintext blob into a self-framing ciphertext.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, TelewatchError> {
        let (ciphertext, nonce) = crypto::seal(&self.key, plaintext)?;
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a self-framing blob produced by [`encrypt`](Self::encrypt).
    ///
    /// Truncated, tampered, or foreign-key blobs fail with
    /// [`TelewatchError::CorruptCredential`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, TelewatchError> {
        if blob.len() < NONCE_LEN {
            return Err(TelewatchError::CorruptCredential);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce: [u8; 12] = nonce_bytes
            .try_into()
            .map_err(|_| TelewatchError::CorruptCredential)?;
        crypto::open(&self.key, &nonce, ciphertext)
    }
}
