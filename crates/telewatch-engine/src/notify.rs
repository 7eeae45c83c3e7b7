// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Match notification fan-out.
//!
//! Two delivery legs with different guarantees: the saved-messages leg is
//! load-bearing (its failure propagates to the caller, which treats it as
//! an event-handling failure), while the webhook leg is strictly
//! fire-and-forget -- a slow or dead webhook endpoint must never stall the
//! event loop or affect the saved-messages delivery.

use std::time::Duration;

use telewatch_config::model::NotifyConfig;
use telewatch_core::{AccountStream, MatchPayload, TelewatchError};
use tracing::debug;

/// Delivers match notifications to saved messages and optional webhooks.
pub struct NotificationSink {
    http: reqwest::Client,
    webhook_timeout: Duration,
}

impl NotificationSink {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_timeout: Duration::from_secs(config.webhook_timeout_secs),
        }
    }

    /// Deliver one matched event: saved messages first (must succeed), then
    /// the webhook in a detached task.
    pub async fn deliver(
        &self,
        stream: &dyn AccountStream,
        payload: &MatchPayload,
        webhook: Option<&str>,
    ) -> Result<(), TelewatchError> {
        stream.send_to_saved(&render_text(payload)).await?;

        if let Some(url) = webhook {
            let request = self
                .http
                .post(url)
                .timeout(self.webhook_timeout)
                .json(payload);
            let url = url.to_string();
            tokio::spawn(async move {
                match request.send().await {
                    Ok(response) => {
                        debug!(url, status = %response.status(), "webhook delivered");
                    }
                    Err(e) => {
                        debug!(url, error = %e, "webhook delivery failed");
                    }
                }
            });
        }
        Ok(())
    }
}

/// Render the saved-messages notification text.
fn render_text(payload: &MatchPayload) -> String {
    let mut out = String::from("Match");
    if let Some(chat) = &payload.chat {
        out.push_str(&format!("\nChat: {chat}"));
    }
    if let Some(link) = &payload.link {
        out.push('\n');
        out.push_str(link);
    }
    out.push('\n');
    out.push_str(&payload.matched_at);
    out.push_str("\n\n");
    out.push_str(&payload.text);
    out
}
