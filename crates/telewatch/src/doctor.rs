// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `telewatch doctor` command implementation.
//!
//! Runs diagnostic checks against the Telewatch environment to identify
//! configuration, vault, and storage issues before the daemon starts.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use telewatch_config::model::TelewatchConfig;
use telewatch_core::TelewatchError;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `telewatch doctor` command.
///
/// Runs quick diagnostic checks. With `--deep`, runs additional intensive
/// checks.
pub async fn run_doctor(config: &TelewatchConfig, deep: bool) -> Result<(), TelewatchError> {
    let use_color = std::io::stdout().is_terminal();
    let mut results = Vec::new();

    results.push(check_config().await);
    results.push(check_vault_key(config));
    results.push(check_remote_credentials(config));
    results.push(check_database(&config.storage.database_path).await);

    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_session_count(&config.storage.database_path).await);
    }

    println!();
    println!("  telewatch doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✓".green(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "!".yellow(),
                        result.name,
                        result.message.yellow()
                    )
                } else {
                    format!(
                        "    [WARN] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✗".red(),
                        result.name,
                        result.message.red()
                    )
                } else {
                    format!(
                        "    [FAIL] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }

    println!();

    Ok(())
}

/// Check configuration loads without errors.
async fn check_config() -> CheckResult {
    let start = Instant::now();
    match telewatch_config::load_and_validate() {
        Ok(_) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Pass,
            message: "valid".to_string(),
            duration: start.elapsed(),
        },
        Err(errors) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Fail,
            message: format!("{} error(s)", errors.len()),
            duration: start.elapsed(),
        },
    }
}

/// Check the vault key is configured and well-formed.
///
/// A missing key is a warning, not a failure: serve generates one at
/// startup, but sessions encrypted under a generated key are lost on the
/// next restart unless the operator persists it.
fn check_vault_key(config: &TelewatchConfig) -> CheckResult {
    let start = Instant::now();
    match &config.vault.key {
        None => CheckResult {
            name: "Vault key".to_string(),
            status: CheckStatus::Warn,
            message: "not configured (a fresh key is generated each start)".to_string(),
            duration: start.elapsed(),
        },
        Some(encoded) => match BASE64.decode(encoded.trim()) {
            Ok(raw) if raw.len() == 32 => CheckResult {
                name: "Vault key".to_string(),
                status: CheckStatus::Pass,
                message: "configured".to_string(),
                duration: start.elapsed(),
            },
            Ok(raw) => CheckResult {
                name: "Vault key".to_string(),
                status: CheckStatus::Fail,
                message: format!("expected 32 bytes, got {}", raw.len()),
                duration: start.elapsed(),
            },
            Err(e) => CheckResult {
                name: "Vault key".to_string(),
                status: CheckStatus::Fail,
                message: format!("invalid base64: {e}"),
                duration: start.elapsed(),
            },
        },
    }
}

/// Check the remote API credentials are present.
fn check_remote_credentials(config: &TelewatchConfig) -> CheckResult {
    let start = Instant::now();
    if config.remote.api_id.is_some() && config.remote.api_hash.is_some() {
        CheckResult {
            name: "Remote API".to_string(),
            status: CheckStatus::Pass,
            message: "credentials configured".to_string(),
            duration: start.elapsed(),
        }
    } else {
        CheckResult {
            name: "Remote API".to_string(),
            status: CheckStatus::Warn,
            message: "api_id/api_hash not configured".to_string(),
            duration: start.elapsed(),
        }
    }
}

/// Check database file exists and can be opened.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: format!("not found: {db_path} (will be created on first run)"),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let query_result: Result<(), tokio_rusqlite::Error> = conn
                .call(|conn| {
                    conn.execute_batch("SELECT 1")?;
                    Ok(())
                })
                .await;

            match query_result {
                Ok(()) => CheckResult {
                    name: "Database".to_string(),
                    status: CheckStatus::Pass,
                    message: "connected".to_string(),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "Database".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("query failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "DB integrity".to_string(),
            status: CheckStatus::Warn,
            message: "database not found (skipped)".to_string(),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<Vec<String>, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                    let rows: Vec<String> = stmt
                        .query_map([], |row| row.get(0))?
                        .filter_map(|r| r.ok())
                        .collect();
                    Ok(rows)
                })
                .await;

            match result {
                Ok(rows) if rows.len() == 1 && rows[0] == "ok" => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Pass,
                    message: "ok".to_string(),
                    duration: start.elapsed(),
                },
                Ok(rows) => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("{} issue(s) found", rows.len()),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "DB integrity".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("check failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "DB integrity".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: number of stored sessions eligible for monitor resumption.
async fn check_session_count(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let path = std::path::Path::new(db_path);

    if !path.exists() {
        return CheckResult {
            name: "Stored sessions".to_string(),
            status: CheckStatus::Warn,
            message: "database not found (skipped)".to_string(),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<i64, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let count =
                        conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
                    Ok(count)
                })
                .await;

            match result {
                Ok(count) => CheckResult {
                    name: "Stored sessions".to_string(),
                    status: CheckStatus::Pass,
                    message: format!("{count} session(s)"),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name: "Stored sessions".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("query failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name: "Stored sessions".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}
