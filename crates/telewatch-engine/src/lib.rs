// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Telewatch engine: login state machine, per-user monitor registry,
//! message filtering, and match notification fan-out.
//!
//! [`Engine`] wires the pieces together over a [`SessionStore`] and a
//! [`RemoteAccountClient`] implementation; the command front end drives it
//! through [`commands::dispatch`].

use std::sync::Arc;

use telewatch_config::model::NotifyConfig;
use telewatch_core::RemoteAccountClient;
use telewatch_storage::SessionStore;

pub mod auth;
pub mod commands;
pub mod filter;
pub mod notify;
pub mod registry;
#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthFlow, AuthOutcome};
pub use commands::{Command, dispatch};
pub use filter::FilterRule;
pub use notify::NotificationSink;
pub use registry::MonitorRegistry;

/// The assembled engine: one per daemon process.
pub struct Engine {
    store: Arc<SessionStore>,
    auth: AuthFlow,
    registry: Arc<MonitorRegistry>,
}

impl Engine {
    pub fn new(
        store: Arc<SessionStore>,
        remote: Arc<dyn RemoteAccountClient>,
        notify: &NotifyConfig,
    ) -> Self {
        let sink = Arc::new(NotificationSink::new(notify));
        let registry = MonitorRegistry::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            sink,
            notify.max_body_chars,
        );
        let auth = AuthFlow::new(Arc::clone(&store), remote, Arc::clone(&registry));
        Self {
            store,
            auth,
            registry,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    pub fn registry(&self) -> &Arc<MonitorRegistry> {
        &self.registry
    }

    /// Start monitors for every stored session; called once at boot.
    pub async fn resume_all(&self) -> Result<usize, telewatch_core::TelewatchError> {
        self.registry.resume_all().await
    }
}
