// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types as stored (blob columns are vault ciphertext).

/// Raw `pending` row; `tmp_enc_session` is ciphertext.
#[derive(Debug, Clone)]
pub struct PendingRow {
    pub tg_id: i64,
    pub tmp_enc_session: Vec<u8>,
    pub phone: String,
    pub code_hash: Option<String>,
    pub attempt_id: i64,
    pub sent_at: String,
}

/// Raw `sessions` row; `enc_session` is ciphertext.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub tg_id: i64,
    pub enc_session: Vec<u8>,
    pub phone: Option<String>,
    pub keywords: String,
    pub negative: String,
    pub only_public: bool,
    pub webhook: String,
    pub created_at: String,
}

/// Which filter column a partial update targets.
///
/// Modeled as an enum so the column name can never come from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Keywords,
    Negative,
}

impl FilterField {
    pub fn column(self) -> &'static str {
        match self {
            FilterField::Keywords => "keywords",
            FilterField::Negative => "negative",
        }
    }
}
