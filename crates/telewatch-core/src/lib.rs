// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Telewatch monitoring daemon.
//!
//! Provides the error taxonomy, shared types, and the capability traits
//! (remote account client, live event stream) that the engine crates are
//! written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TelewatchError;
pub use traits::{AccountStream, RemoteAccountClient};
pub use types::{
    CodeRequest, InboundEvent, LoginOutcome, MatchPayload, PendingLogin, StoredSession, UserId,
};
