// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `telewatch serve` command implementation.
//!
//! Opens the credential vault and session store, assembles the engine,
//! resumes monitors for every stored session, and runs until SIGINT or
//! SIGTERM. Shutdown cancels all monitor tasks and checkpoints the
//! database.

use std::sync::Arc;

use telewatch_config::model::TelewatchConfig;
use telewatch_core::{RemoteAccountClient, TelewatchError};
use telewatch_engine::Engine;
use telewatch_storage::SessionStore;
use telewatch_vault::CredentialVault;
use tracing::{info, warn};

use crate::remote::UnavailableRemote;
use crate::shutdown;

/// Runs the `telewatch serve` command.
pub async fn run_serve(config: TelewatchConfig) -> Result<(), TelewatchError> {
    init_tracing(&config.agent.log_level);

    info!("starting telewatch serve");

    let vault = CredentialVault::from_config(&config.vault)?;
    let store = Arc::new(SessionStore::open(&config.storage, vault).await?);

    let remote: Arc<dyn RemoteAccountClient> = Arc::new(UnavailableRemote::new(&config.remote));
    let engine = Engine::new(Arc::clone(&store), remote, &config.notify);

    let resumed = engine.resume_all().await?;
    info!(resumed, "telewatch serve started");

    let cancel = shutdown::install_signal_handler();
    cancel.cancelled().await;

    info!("shutting down");
    engine.registry().shutdown().await;
    drop(engine);
    match Arc::try_unwrap(store) {
        Ok(store) => store.close().await?,
        Err(_) => warn!("session store still shared at shutdown, skipping checkpoint"),
    }

    info!("telewatch serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("telewatch={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
