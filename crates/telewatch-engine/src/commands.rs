// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing command handling.
//!
//! Commands arrive from whatever front end the deployment wires up; this
//! module maps them onto engine operations and renders every outcome --
//! success or failure -- as a plain-text reply. Infrastructure errors are
//! logged and collapsed into a generic reply so internal details never
//! reach the user.

use telewatch_core::{TelewatchError, UserId};
use telewatch_storage::FilterField;
use tracing::warn;

use crate::Engine;
use crate::auth::AuthOutcome;
use crate::filter;

/// A parsed user command with its argument, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Connect,
    Phone(String),
    Code(String),
    Resend,
    Password(String),
    Keywords(String),
    Negative(String),
    Status,
}

/// Execute one command for one user and render the reply.
pub async fn dispatch(engine: &Engine, tg_id: UserId, command: Command) -> String {
    match command {
        Command::Start => concat!(
            "Telewatch monitors your account for messages matching your filters.\n",
            "/connect - link your account\n",
            "/keywords <pattern> - set the keyword filter\n",
            "/negative <pattern> - set the exclusion filter\n",
            "/status - show current configuration"
        )
        .to_string(),
        Command::Connect => {
            "Send your phone number: /phone +15551234567".to_string()
        }
        Command::Phone(phone) => match engine.auth().start_login(tg_id, &phone).await {
            Ok(()) => "Code sent. Reply with /code 12345, or /resend for a new one.".to_string(),
            Err(e) => render_error(tg_id, e),
        },
        Command::Code(code) => match engine.auth().confirm_code(tg_id, &code).await {
            Ok(AuthOutcome::Active) => {
                "Connected. Monitoring is running; /status to check.".to_string()
            }
            Ok(AuthOutcome::PasswordRequired) => {
                "Two-factor auth is enabled. Send /password <your password>.".to_string()
            }
            Err(e) => render_error(tg_id, e),
        },
        Command::Resend => match engine.auth().resend_code(tg_id).await {
            Ok(()) => "A new code is on its way. Reply with /code 12345.".to_string(),
            Err(e) => render_error(tg_id, e),
        },
        Command::Password(password) => {
            match engine.auth().confirm_password(tg_id, &password).await {
                Ok(AuthOutcome::Active) => {
                    "Connected. Monitoring is running; /status to check.".to_string()
                }
                Ok(AuthOutcome::PasswordRequired) => {
                    "The account still requires a password. Try /password again.".to_string()
                }
                Err(e) => render_error(tg_id, e),
            }
        }
        Command::Keywords(pattern) => {
            set_filter(engine, tg_id, FilterField::Keywords, &pattern).await
        }
        Command::Negative(pattern) => {
            set_filter(engine, tg_id, FilterField::Negative, &pattern).await
        }
        Command::Status => status(engine, tg_id).await,
    }
}

async fn set_filter(engine: &Engine, tg_id: UserId, field: FilterField, pattern: &str) -> String {
    let pattern = pattern.trim();
    if let Err(e) = filter::validate_pattern(pattern) {
        return render_error(tg_id, e);
    }
    match engine.store().update_filter(tg_id, field, pattern).await {
        Ok(true) => {
            let label = match field {
                FilterField::Keywords => "Keyword",
                FilterField::Negative => "Exclusion",
            };
            format!("{label} filter updated. It takes effect when the monitor restarts.")
        }
        Ok(false) => "No linked account. Send /connect first.".to_string(),
        Err(e) => render_error(tg_id, e),
    }
}

async fn status(engine: &Engine, tg_id: UserId) -> String {
    match engine.store().get_session(tg_id).await {
        Ok(Some(session)) => {
            let monitoring = if engine.registry().is_active(tg_id) {
                "running"
            } else {
                "stopped"
            };
            format!(
                "Monitoring: {monitoring}\nKeywords: {}\nNegative: {}\nPublic chats only: {}",
                render_pattern(&session.keywords),
                render_pattern(&session.negative),
                if session.only_public { "yes" } else { "no" },
            )
        }
        Ok(None) => "No linked account. Send /connect to begin.".to_string(),
        Err(e) => render_error(tg_id, e),
    }
}

fn render_pattern(pattern: &str) -> &str {
    if pattern.is_empty() { "(unset)" } else { pattern }
}

/// Map the login taxonomy onto user-facing replies. Infrastructure failures
/// are logged here and deliberately not echoed back.
fn render_error(tg_id: UserId, error: TelewatchError) -> String {
    match error {
        TelewatchError::InvalidPhoneFormat => {
            "That phone number was rejected. Format: /phone +15551234567".to_string()
        }
        TelewatchError::NoPendingLogin => {
            "No login in progress. Send /connect to begin.".to_string()
        }
        TelewatchError::MissingCodeHash => {
            "This attempt has no active code. Send /resend, then /code again.".to_string()
        }
        TelewatchError::InvalidCode => {
            "Wrong code. Try /code again, or /resend for a new one.".to_string()
        }
        TelewatchError::CodeExpired => "That code expired. Send /resend for a new one.".to_string(),
        TelewatchError::RateLimited { retry_after } => format!(
            "Too many attempts. Wait {}s and try again.",
            retry_after.as_secs()
        ),
        TelewatchError::PasswordRejected { detail } => {
            format!("Password not accepted: {detail}")
        }
        TelewatchError::Superseded => {
            "A newer login attempt replaced this one. Use the latest code.".to_string()
        }
        TelewatchError::CorruptCredential => {
            "Stored credentials can no longer be read. Send /connect to log in again.".to_string()
        }
        TelewatchError::Config(message) => format!("Invalid pattern: {message}"),
        other => {
            warn!(user = tg_id, error = %other, "command failed");
            "Something went wrong. Please try again later.".to_string()
        }
    }
}
