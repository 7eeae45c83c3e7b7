// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Telewatch workspace.

use serde::{Deserialize, Serialize};

/// Stable numeric account identifier for a monitored user.
pub type UserId = i64;

/// An in-flight login attempt, one per user at most.
///
/// Exists only between "code requested" and either login completion or
/// abandonment. `attempt_id` is a monotonic epoch: every rewrite of the
/// pending row bumps it, and commits must verify they still hold the
/// current epoch (see `SessionStore::commit_login`).
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub tg_id: UserId,
    /// Decrypted opaque blob for the unauthenticated remote connection.
    pub tmp_session: Vec<u8>,
    pub phone: String,
    /// Provider-issued correlation token for the last sent one-time code.
    pub code_hash: Option<String>,
    pub attempt_id: i64,
    pub sent_at: String,
}

/// A confirmed session row: the authenticated connection blob plus the
/// user's filter configuration.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub tg_id: UserId,
    /// Decrypted opaque authenticated-connection blob.
    pub session: Vec<u8>,
    /// Absent when login completed via the password flow.
    pub phone: Option<String>,
    /// Keyword regex pattern; empty string means unset.
    pub keywords: String,
    /// Negative regex pattern; empty string means unset.
    pub negative: String,
    /// Restrict matches to chats with a public identifier.
    pub only_public: bool,
    /// Optional webhook URL for match fan-out.
    pub webhook: Option<String>,
    pub created_at: String,
}

/// Result of requesting (or re-requesting) a one-time code.
#[derive(Debug, Clone)]
pub struct CodeRequest {
    /// Serialized unauthenticated connection state to persist for the
    /// next step of the flow.
    pub tmp_session: Vec<u8>,
    /// Correlation token binding the code to the requesting connection.
    pub code_hash: String,
}

/// Outcome of a sign-in attempt against the remote account client.
///
/// `PasswordRequired` is a normal state transition, not a failure: the
/// account has two-factor auth enabled and the flow moves to the password
/// step with the pending row retained unchanged.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Authenticated; `session` is the durable opaque connection blob.
    Authorized { session: Vec<u8> },
    /// The account requires a two-factor password.
    PasswordRequired,
}

/// A single inbound message event from a live monitoring connection.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Display title of the originating chat, when the provider reports one.
    pub chat_title: Option<String>,
    /// Public identifier (username/handle) of the chat, if it has one.
    pub public_handle: Option<String>,
    /// Provider-assigned message identifier, used for deep links.
    pub message_id: i64,
    pub text: String,
}

/// Notification payload built from a matched event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchPayload {
    /// Chat title, falling back to the public handle.
    pub chat: Option<String>,
    /// Deep link to the message when the chat has a public handle.
    pub link: Option<String>,
    /// Message body, truncated to the configured budget.
    pub text: String,
    /// RFC 3339 UTC timestamp of the match.
    pub matched_at: String,
}
