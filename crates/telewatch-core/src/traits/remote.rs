// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The remote account client capability.
//!
//! Abstracts the messaging network's user-authentication and live-event
//! protocol. The wire protocol itself is out of scope for this workspace;
//! production deployments link in an implementation, and tests use mocks.
//!
//! Every method that continues a login flow takes the serialized connection
//! state (`tmp_session`) produced by the previous step: connections are
//! never held in process memory between user actions, so the flow survives
//! restarts between any two steps.

use async_trait::async_trait;

use crate::error::TelewatchError;
use crate::types::{CodeRequest, InboundEvent, LoginOutcome};

/// Client capability for authenticating a user account and opening live
/// monitoring connections.
///
/// Implementations must translate provider failures into the login taxonomy
/// of [`TelewatchError`] (`InvalidPhoneFormat`, `InvalidCode`, `CodeExpired`,
/// `RateLimited`); transport failures use [`TelewatchError::Remote`].
#[async_trait]
pub trait RemoteAccountClient: Send + Sync {
    /// Open a fresh unauthenticated connection and request a one-time code
    /// for `phone`. Returns the connection blob to persist and the
    /// correlation token for the sent code.
    async fn request_code(&self, phone: &str) -> Result<CodeRequest, TelewatchError>;

    /// Re-request a code on an existing unauthenticated connection, keyed by
    /// the previous correlation token.
    async fn resend_code(
        &self,
        tmp_session: &[u8],
        phone: &str,
        code_hash: &str,
    ) -> Result<CodeRequest, TelewatchError>;

    /// Submit phone + one-time code + correlation token. On success yields
    /// the durable authenticated-connection blob; an account with two-factor
    /// auth enabled yields [`LoginOutcome::PasswordRequired`] instead.
    async fn confirm_code(
        &self,
        tmp_session: &[u8],
        phone: &str,
        code: &str,
        code_hash: &str,
    ) -> Result<LoginOutcome, TelewatchError>;

    /// Submit the two-factor password against the pending connection.
    async fn confirm_password(
        &self,
        tmp_session: &[u8],
        password: &str,
    ) -> Result<LoginOutcome, TelewatchError>;

    /// Reconstruct an authenticated connection from its blob and open a live
    /// inbound-event stream.
    async fn open_monitor(
        &self,
        session: &[u8],
    ) -> Result<Box<dyn AccountStream>, TelewatchError>;
}

/// A live, long-running event-stream connection for one user.
///
/// `Sync` is required: the monitor task shares the stream with the
/// notification path across await points inside a spawned future.
#[async_trait]
pub trait AccountStream: Send + Sync {
    /// Wait for the next inbound message event. `Ok(None)` means the stream
    /// ended cleanly (remote disconnect).
    async fn next_event(&mut self) -> Result<Option<InboundEvent>, TelewatchError>;

    /// Send a message to the account's own "saved messages" destination.
    async fn send_to_saved(&self, text: &str) -> Result<(), TelewatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_objects_can_cross_task_boundaries() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn RemoteAccountClient>();
        assert_send_sync::<dyn AccountStream>();
    }
}
