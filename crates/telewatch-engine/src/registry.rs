// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The monitor registry: at most one live monitoring task per user.
//!
//! Each entry carries a generation number so a task that exits on its own
//! only deregisters itself -- never a successor that replaced it in the
//! meantime. Slot claiming happens under the map lock with the task spawned
//! inside the critical section, so two concurrent `start` calls for the
//! same user cannot both open a connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use telewatch_core::{
    AccountStream, InboundEvent, MatchPayload, RemoteAccountClient, StoredSession, TelewatchError,
    UserId,
};
use telewatch_storage::{SessionStore, now_iso};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::filter::FilterRule;
use crate::notify::NotificationSink;

struct MonitorHandle {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Registry of live per-user monitoring tasks.
pub struct MonitorRegistry {
    store: Arc<SessionStore>,
    remote: Arc<dyn RemoteAccountClient>,
    sink: Arc<NotificationSink>,
    max_body_chars: usize,
    active: Mutex<HashMap<UserId, MonitorHandle>>,
    next_generation: AtomicU64,
}

impl MonitorRegistry {
    pub fn new(
        store: Arc<SessionStore>,
        remote: Arc<dyn RemoteAccountClient>,
        sink: Arc<NotificationSink>,
        max_body_chars: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            remote,
            sink,
            max_body_chars,
            active: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        })
    }

    /// Start a monitor for `tg_id` if a confirmed session exists and no
    /// monitor is already running. Returns `true` when a new task was
    /// spawned.
    pub async fn start(self: &Arc<Self>, tg_id: UserId) -> Result<bool, TelewatchError> {
        let Some(session) = self.store.get_session(tg_id).await? else {
            debug!(user = tg_id, "no confirmed session, monitor not started");
            return Ok(false);
        };
        let rule = FilterRule::compile_lenient(&session.keywords, &session.negative);

        let mut active = self.active.lock().map_err(poisoned)?;
        if active.contains_key(&tg_id) {
            debug!(user = tg_id, "monitor already running");
            return Ok(false);
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(monitor_task(
            Arc::clone(self),
            tg_id,
            generation,
            session,
            rule,
            cancel.clone(),
        ));
        active.insert(
            tg_id,
            MonitorHandle {
                generation,
                cancel,
                task,
            },
        );
        Ok(true)
    }

    /// Cancel and await the monitor for `tg_id`. Returns `true` when a task
    /// was running.
    pub async fn stop(&self, tg_id: UserId) -> bool {
        let handle = match self.active.lock() {
            Ok(mut active) => active.remove(&tg_id),
            Err(_) => None,
        };
        let Some(handle) = handle else {
            return false;
        };
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            warn!(user = tg_id, error = %e, "monitor task join failed");
        }
        info!(user = tg_id, "monitor stopped");
        true
    }

    /// Stop any running monitor and start a fresh one from the current
    /// session row. Called after every successful login so new credentials
    /// and filters take effect immediately.
    pub async fn restart(self: &Arc<Self>, tg_id: UserId) -> Result<bool, TelewatchError> {
        self.stop(tg_id).await;
        self.start(tg_id).await
    }

    /// Start monitors for every stored session. Per-user failures are logged
    /// and skipped; returns the number of monitors started.
    pub async fn resume_all(self: &Arc<Self>) -> Result<usize, TelewatchError> {
        let ids = self.store.session_user_ids().await?;
        let mut started = 0;
        for tg_id in ids {
            match self.start(tg_id).await {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(e) => warn!(user = tg_id, error = %e, "failed to resume monitor"),
            }
        }
        info!(started, "session monitors resumed");
        Ok(started)
    }

    pub fn is_active(&self, tg_id: UserId) -> bool {
        self.active
            .lock()
            .map(|active| active.contains_key(&tg_id))
            .unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().map(|active| active.len()).unwrap_or(0)
    }

    /// Cancel every running monitor. Used at daemon shutdown.
    pub async fn shutdown(&self) {
        let handles: Vec<(UserId, MonitorHandle)> = match self.active.lock() {
            Ok(mut active) => active.drain().collect(),
            Err(_) => Vec::new(),
        };
        for (tg_id, handle) in handles {
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                warn!(user = tg_id, error = %e, "monitor task join failed");
            }
        }
    }

    /// Remove the registry entry for `tg_id`, but only if it still belongs
    /// to `generation`.
    fn deregister(&self, tg_id: UserId, generation: u64) {
        if let Ok(mut active) = self.active.lock()
            && active.get(&tg_id).map(|h| h.generation) == Some(generation)
        {
            active.remove(&tg_id);
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> TelewatchError {
    TelewatchError::Internal("monitor registry lock poisoned".to_string())
}

async fn monitor_task(
    registry: Arc<MonitorRegistry>,
    tg_id: UserId,
    generation: u64,
    session: StoredSession,
    rule: FilterRule,
    cancel: CancellationToken,
) {
    let mut stream = match registry.remote.open_monitor(&session.session).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(user = tg_id, error = %e, "failed to open monitoring connection");
            registry.deregister(tg_id, generation);
            return;
        }
    };
    info!(user = tg_id, "monitor connected");

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = stream.next_event() => next,
        };
        match next {
            Ok(Some(event)) => {
                // One bad event must never take down the connection.
                if let Err(e) =
                    handle_event(&registry, &session, &rule, stream.as_ref(), &event).await
                {
                    warn!(user = tg_id, error = %e, "event handling failed");
                }
            }
            Ok(None) => {
                info!(user = tg_id, "monitor stream ended");
                break;
            }
            Err(e) => {
                warn!(user = tg_id, error = %e, "monitor stream error");
                break;
            }
        }
    }
    registry.deregister(tg_id, generation);
}

async fn handle_event(
    registry: &MonitorRegistry,
    session: &StoredSession,
    rule: &FilterRule,
    stream: &dyn AccountStream,
    event: &InboundEvent,
) -> Result<(), TelewatchError> {
    if session.only_public && event.public_handle.is_none() {
        return Ok(());
    }
    if !rule.matches(&event.text) {
        return Ok(());
    }
    let payload = build_payload(event, registry.max_body_chars);
    registry
        .sink
        .deliver(stream, &payload, session.webhook.as_deref())
        .await
}

/// Build the notification payload for a matched event: chat label with
/// handle fallback, deep link for public chats, body truncated on a char
/// boundary.
fn build_payload(event: &InboundEvent, max_body_chars: usize) -> MatchPayload {
    let chat = event
        .chat_title
        .clone()
        .or_else(|| event.public_handle.clone());
    let link = event
        .public_handle
        .as_ref()
        .map(|handle| format!("https://t.me/{handle}/{}", event.message_id));
    MatchPayload {
        chat,
        link,
        text: truncate_chars(&event.text, max_body_chars),
        matched_at: now_iso(),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
