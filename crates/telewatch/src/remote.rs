// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder remote account client.
//!
//! The messaging network's wire protocol is not part of this workspace;
//! deployments link a [`RemoteAccountClient`] implementation built on a
//! protocol library and hand it to [`telewatch_engine::Engine`]. This stub
//! keeps `telewatch serve` runnable without one: storage, configuration,
//! and command handling all work, and every remote operation reports the
//! missing capability.

use async_trait::async_trait;
use telewatch_config::model::RemoteConfig;
use telewatch_core::{
    AccountStream, CodeRequest, LoginOutcome, RemoteAccountClient, TelewatchError,
};
use tracing::warn;

const UNAVAILABLE: &str = "no remote account client is linked into this build";

/// A remote account client that reports every operation as unavailable.
pub struct UnavailableRemote;

impl UnavailableRemote {
    pub fn new(config: &RemoteConfig) -> Self {
        if config.api_id.is_none() || config.api_hash.is_none() {
            warn!("remote.api_id / remote.api_hash not configured");
        }
        Self
    }
}

#[async_trait]
impl RemoteAccountClient for UnavailableRemote {
    async fn request_code(&self, _phone: &str) -> Result<CodeRequest, TelewatchError> {
        Err(TelewatchError::remote(UNAVAILABLE))
    }

    async fn resend_code(
        &self,
        _tmp_session: &[u8],
        _phone: &str,
        _code_hash: &str,
    ) -> Result<CodeRequest, TelewatchError> {
        Err(TelewatchError::remote(UNAVAILABLE))
    }

    async fn confirm_code(
        &self,
        _tmp_session: &[u8],
        _phone: &str,
        _code: &str,
        _code_hash: &str,
    ) -> Result<LoginOutcome, TelewatchError> {
        Err(TelewatchError::remote(UNAVAILABLE))
    }

    async fn confirm_password(
        &self,
        _tmp_session: &[u8],
        _password: &str,
    ) -> Result<LoginOutcome, TelewatchError> {
        Err(TelewatchError::remote(UNAVAILABLE))
    }

    async fn open_monitor(
        &self,
        _session: &[u8],
    ) -> Result<Box<dyn AccountStream>, TelewatchError> {
        Err(TelewatchError::remote(UNAVAILABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_operation_reports_unavailable() {
        let remote = UnavailableRemote::new(&RemoteConfig::default());
        assert!(matches!(
            remote.request_code("+1").await,
            Err(TelewatchError::Remote { .. })
        ));
        assert!(matches!(
            remote.open_monitor(b"blob").await,
            Err(TelewatchError::Remote { .. })
        ));
    }
}
