// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message filter: a pure predicate over inbound message text.
//!
//! Patterns are validated when the user configures them (`/keywords`,
//! `/negative`), never at match time -- matching cannot fail. Both patterns
//! are case-insensitive and `.` matches newlines, so a pattern may span
//! logical lines.

use regex::{Regex, RegexBuilder};
use telewatch_core::TelewatchError;
use tracing::warn;

/// A compiled keyword/negative pattern pair for one user.
#[derive(Debug, Clone)]
pub struct FilterRule {
    keyword: Option<Regex>,
    negative: Option<Regex>,
}

impl FilterRule {
    /// Compile both patterns, rejecting malformed ones. Empty strings mean
    /// "unset".
    pub fn compile(keywords: &str, negative: &str) -> Result<Self, TelewatchError> {
        Ok(Self {
            keyword: compile_pattern(keywords)?,
            negative: compile_pattern(negative)?,
        })
    }

    /// Compile for a running monitor: a stored pattern that no longer
    /// compiles is treated as unset (and logged) rather than failing the
    /// monitor. Configuration-time validation makes this unreachable in
    /// practice.
    pub fn compile_lenient(keywords: &str, negative: &str) -> Self {
        let keyword = compile_pattern(keywords).unwrap_or_else(|e| {
            warn!(error = %e, "stored keyword pattern no longer compiles, treating as unset");
            None
        });
        let negative = compile_pattern(negative).unwrap_or_else(|e| {
            warn!(error = %e, "stored negative pattern no longer compiles, treating as unset");
            None
        });
        Self { keyword, negative }
    }

    /// Pure match predicate.
    ///
    /// Empty text never matches. A set keyword pattern must match (vacuously
    /// true when unset). A matching negative pattern forces `false`
    /// regardless of the keyword outcome.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if let Some(keyword) = &self.keyword
            && !keyword.is_match(text)
        {
            return false;
        }
        if let Some(negative) = &self.negative
            && negative.is_match(text)
        {
            return false;
        }
        true
    }
}

/// Compile a single user-supplied pattern; empty/whitespace means unset.
fn compile_pattern(pattern: &str) -> Result<Option<Regex>, TelewatchError> {
    if pattern.trim().is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map(Some)
        .map_err(|e| TelewatchError::Config(format!("invalid filter pattern: {e}")))
}

/// Validate a pattern at configuration time without keeping the compiled
/// regex.
pub fn validate_pattern(pattern: &str) -> Result<(), TelewatchError> {
    compile_pattern(pattern).map(|_| ())
}
