// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted-at-rest credential vault for the Telewatch daemon.
//!
//! Every opaque connection/session token persisted to the store passes
//! through this crate: AES-256-GCM with a process-wide symmetric key,
//! tamper-evident by construction.

pub mod crypto;
pub mod vault;

pub use vault::CredentialVault;
