// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The remote-account login state machine.
//!
//! Every step loads its state from the pending row and persists the result
//! before returning, so the flow survives a daemon restart between any two
//! steps. Commit goes through `SessionStore::commit_login`, which verifies
//! the attempt epoch: a code confirmed against an attempt that was replaced
//! mid-flight fails with `Superseded` instead of resurrecting stale
//! credentials.

use std::sync::Arc;

use telewatch_core::{LoginOutcome, RemoteAccountClient, TelewatchError, UserId};
use telewatch_storage::SessionStore;
use tracing::{debug, info, warn};

use crate::registry::MonitorRegistry;

/// What the user should do next after a successful confirm step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Login complete; the monitor is running.
    Active,
    /// The account has two-factor auth enabled; the password step follows.
    PasswordRequired,
}

/// Drives the multi-step login flow against the remote account client.
pub struct AuthFlow {
    store: Arc<SessionStore>,
    remote: Arc<dyn RemoteAccountClient>,
    registry: Arc<MonitorRegistry>,
}

impl AuthFlow {
    pub fn new(
        store: Arc<SessionStore>,
        remote: Arc<dyn RemoteAccountClient>,
        registry: Arc<MonitorRegistry>,
    ) -> Self {
        Self {
            store,
            remote,
            registry,
        }
    }

    /// Request a one-time code for `phone` and persist the pending attempt.
    /// Replaces any prior pending login for this user.
    pub async fn start_login(&self, tg_id: UserId, phone: &str) -> Result<(), TelewatchError> {
        let phone = phone.trim();
        self.store.touch_user(tg_id).await?;
        let code = self.remote.request_code(phone).await?;
        let attempt = self
            .store
            .upsert_pending(tg_id, &code.tmp_session, phone, Some(&code.code_hash))
            .await?;
        debug!(user = tg_id, attempt, "login code requested");
        Ok(())
    }

    /// Re-request a code for the in-flight attempt. Falls back to a fresh
    /// `request_code` when no correlation token was recorded.
    pub async fn resend_code(&self, tg_id: UserId) -> Result<(), TelewatchError> {
        let pending = self
            .store
            .get_pending(tg_id)
            .await?
            .ok_or(TelewatchError::NoPendingLogin)?;

        let code = match &pending.code_hash {
            Some(hash) => {
                self.remote
                    .resend_code(&pending.tmp_session, &pending.phone, hash)
                    .await?
            }
            None => self.remote.request_code(&pending.phone).await?,
        };
        let attempt = self
            .store
            .refresh_pending_code(tg_id, &code.tmp_session, &code.code_hash)
            .await?;
        debug!(user = tg_id, attempt, "login code re-sent");
        Ok(())
    }

    /// Submit the one-time code. On success the session is committed and the
    /// monitor (re)started; a two-factor account moves to the password step
    /// with the pending row left in place.
    pub async fn confirm_code(
        &self,
        tg_id: UserId,
        code: &str,
    ) -> Result<AuthOutcome, TelewatchError> {
        let pending = self
            .store
            .get_pending(tg_id)
            .await?
            .ok_or(TelewatchError::NoPendingLogin)?;
        let hash = pending
            .code_hash
            .as_deref()
            .ok_or(TelewatchError::MissingCodeHash)?;

        let outcome = self
            .remote
            .confirm_code(&pending.tmp_session, &pending.phone, code.trim(), hash)
            .await?;
        match outcome {
            LoginOutcome::Authorized { session } => {
                self.finish_login(tg_id, pending.attempt_id, &session, Some(&pending.phone))
                    .await?;
                Ok(AuthOutcome::Active)
            }
            LoginOutcome::PasswordRequired => {
                debug!(user = tg_id, "two-factor password required");
                Ok(AuthOutcome::PasswordRequired)
            }
        }
    }

    /// Submit the two-factor password. Remote rejection of any kind surfaces
    /// as `PasswordRejected`; commit failures keep their own taxonomy.
    pub async fn confirm_password(
        &self,
        tg_id: UserId,
        password: &str,
    ) -> Result<AuthOutcome, TelewatchError> {
        let pending = self
            .store
            .get_pending(tg_id)
            .await?
            .ok_or(TelewatchError::NoPendingLogin)?;

        let outcome = self
            .remote
            .confirm_password(&pending.tmp_session, password)
            .await
            .map_err(|e| TelewatchError::PasswordRejected {
                detail: e.to_string(),
            })?;
        match outcome {
            LoginOutcome::Authorized { session } => {
                // Phone association is not re-derived on the password path.
                self.finish_login(tg_id, pending.attempt_id, &session, None)
                    .await?;
                Ok(AuthOutcome::Active)
            }
            LoginOutcome::PasswordRequired => Err(TelewatchError::PasswordRejected {
                detail: "two-factor password required again".to_string(),
            }),
        }
    }

    /// Commit the confirmed session iff the attempt is still current, then
    /// restart the monitor so the new credentials take effect.
    async fn finish_login(
        &self,
        tg_id: UserId,
        attempt_id: i64,
        session: &[u8],
        phone: Option<&str>,
    ) -> Result<(), TelewatchError> {
        let committed = self
            .store
            .commit_login(tg_id, attempt_id, session, phone)
            .await?;
        if !committed {
            warn!(user = tg_id, attempt_id, "login superseded by a newer attempt");
            return Err(TelewatchError::Superseded);
        }
        info!(user = tg_id, "login confirmed");
        self.registry.restart(tg_id).await?;
        Ok(())
    }
}
