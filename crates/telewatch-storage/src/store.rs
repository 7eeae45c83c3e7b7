// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session store facade: typed operations over the three tables, with
//! the credential vault applied at this boundary. Query modules below only
//! ever see ciphertext; callers above only ever see plaintext blobs.

use chrono::{SecondsFormat, Utc};
use telewatch_config::model::StorageConfig;
use telewatch_core::{PendingLogin, StoredSession, TelewatchError, UserId};
use telewatch_vault::CredentialVault;

use crate::database::{Database, map_tr_err};
use crate::models::FilterField;
use crate::queries;

/// Durable store for pending logins, confirmed sessions, and filter config.
pub struct SessionStore {
    db: Database,
    vault: CredentialVault,
}

/// Current UTC time as an RFC 3339 string with second precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl SessionStore {
    /// Open the store at the configured path and wrap it with `vault`.
    pub async fn open(config: &StorageConfig, vault: CredentialVault) -> Result<Self, TelewatchError> {
        let db = Database::open(&config.database_path).await?;
        if !config.wal_mode {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.pragma_update(None, "journal_mode", "DELETE")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
        }
        Ok(Self { db, vault })
    }

    /// Build a store over an already-open database (tests).
    pub fn new(db: Database, vault: CredentialVault) -> Self {
        Self { db, vault }
    }

    /// Record a user's first interaction. Idempotent.
    pub async fn touch_user(&self, tg_id: UserId) -> Result<(), TelewatchError> {
        queries::sessions::touch_user(&self.db, tg_id, now_iso()).await
    }

    /// Replace any pending login for this user; returns the attempt epoch
    /// the caller must present at commit time.
    pub async fn upsert_pending(
        &self,
        tg_id: UserId,
        tmp_session: &[u8],
        phone: &str,
        code_hash: Option<&str>,
    ) -> Result<i64, TelewatchError> {
        let enc = self.vault.encrypt(tmp_session)?;
        queries::pending::upsert_pending(
            &self.db,
            tg_id,
            enc,
            phone.to_string(),
            code_hash.map(str::to_string),
            now_iso(),
        )
        .await
    }

    /// Overwrite the blob and code hash of the existing pending login,
    /// bumping the attempt epoch. Fails with `NoPendingLogin` when absent.
    pub async fn refresh_pending_code(
        &self,
        tg_id: UserId,
        tmp_session: &[u8],
        code_hash: &str,
    ) -> Result<i64, TelewatchError> {
        let enc = self.vault.encrypt(tmp_session)?;
        queries::pending::refresh_code(&self.db, tg_id, enc, code_hash.to_string(), now_iso())
            .await?
            .ok_or(TelewatchError::NoPendingLogin)
    }

    /// Get the pending login for a user, blob decrypted.
    pub async fn get_pending(&self, tg_id: UserId) -> Result<Option<PendingLogin>, TelewatchError> {
        let Some(row) = queries::pending::get_pending(&self.db, tg_id).await? else {
            return Ok(None);
        };
        let tmp_session = self.vault.decrypt(&row.tmp_enc_session)?;
        Ok(Some(PendingLogin {
            tg_id: row.tg_id,
            tmp_session,
            phone: row.phone,
            code_hash: row.code_hash.filter(|h| !h.is_empty()),
            attempt_id: row.attempt_id,
            sent_at: row.sent_at,
        }))
    }

    /// Delete the pending login for a user, if any.
    pub async fn delete_pending(&self, tg_id: UserId) -> Result<(), TelewatchError> {
        queries::pending::delete_pending(&self.db, tg_id).await
    }

    /// Atomically complete a login attempt: the pending row is deleted iff
    /// `attempt_id` is still current, and the session row replaced. Returns
    /// `false` when the attempt was superseded mid-flight.
    pub async fn commit_login(
        &self,
        tg_id: UserId,
        attempt_id: i64,
        session: &[u8],
        phone: Option<&str>,
    ) -> Result<bool, TelewatchError> {
        let enc = self.vault.encrypt(session)?;
        queries::pending::commit_login(
            &self.db,
            tg_id,
            attempt_id,
            enc,
            phone.map(str::to_string),
            now_iso(),
        )
        .await
    }

    /// Replace the confirmed session row directly (no pending-epoch check).
    pub async fn upsert_session(
        &self,
        tg_id: UserId,
        session: &[u8],
        phone: Option<&str>,
    ) -> Result<(), TelewatchError> {
        let enc = self.vault.encrypt(session)?;
        queries::sessions::upsert_session(&self.db, tg_id, enc, phone.map(str::to_string), now_iso())
            .await
    }

    /// Get the confirmed session for a user, blob decrypted.
    ///
    /// `CorruptCredential` here means the vault key no longer matches the
    /// stored blob -- distinctly different from "never logged in" (`None`).
    pub async fn get_session(&self, tg_id: UserId) -> Result<Option<StoredSession>, TelewatchError> {
        let Some(row) = queries::sessions::get_session(&self.db, tg_id).await? else {
            return Ok(None);
        };
        let session = self.vault.decrypt(&row.enc_session)?;
        Ok(Some(StoredSession {
            tg_id: row.tg_id,
            session,
            phone: row.phone,
            keywords: row.keywords,
            negative: row.negative,
            only_public: row.only_public,
            webhook: Some(row.webhook.trim().to_string()).filter(|w| !w.is_empty()),
            created_at: row.created_at,
        }))
    }

    /// All user ids holding a confirmed session.
    pub async fn session_user_ids(&self) -> Result<Vec<UserId>, TelewatchError> {
        queries::sessions::session_user_ids(&self.db).await
    }

    /// Partial update of one filter column. Returns `false` when the user
    /// has no session row.
    pub async fn update_filter(
        &self,
        tg_id: UserId,
        field: FilterField,
        value: &str,
    ) -> Result<bool, TelewatchError> {
        queries::sessions::update_filter(&self.db, tg_id, field, value.to_string()).await
    }

    /// Toggle public-chat-only matching. Returns `false` when the user has
    /// no session row.
    pub async fn set_only_public(
        &self,
        tg_id: UserId,
        only_public: bool,
    ) -> Result<bool, TelewatchError> {
        queries::sessions::set_only_public(&self.db, tg_id, only_public).await
    }

    /// Checkpoint and close the underlying database.
    pub async fn close(self) -> Result<(), TelewatchError> {
        self.db.close().await
    }

    #[cfg(test)]
    pub(crate) fn db(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use telewatch_vault::crypto::generate_random_key;

    async fn setup() -> (SessionStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let vault = CredentialVault::from_key(generate_random_key().unwrap());
        (SessionStore::new(db, vault), dir)
    }

    #[tokio::test]
    async fn pending_blob_roundtrips_through_vault() {
        let (store, _dir) = setup().await;
        store
            .upsert_pending(42, b"tmp-session-state", "+15551234567", Some("h1"))
            .await
            .unwrap();

        let pending = store.get_pending(42).await.unwrap().unwrap();
        assert_eq!(pending.tmp_session, b"tmp-session-state");
        assert_eq!(pending.code_hash.as_deref(), Some("h1"));

        // The row itself must hold ciphertext, not the plaintext blob.
        let raw = queries::pending::get_pending(store.db(), 42)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(raw.tmp_enc_session, b"tmp-session-state");
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_code_hash_is_treated_as_unset() {
        let (store, _dir) = setup().await;
        store
            .upsert_pending(42, b"tmp", "+1", Some(""))
            .await
            .unwrap();
        let pending = store.get_pending(42).await.unwrap().unwrap();
        assert!(pending.code_hash.is_none());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn session_blob_roundtrips_through_vault() {
        let (store, _dir) = setup().await;
        store
            .upsert_session(42, b"auth-session-state", Some("+1"))
            .await
            .unwrap();

        let session = store.get_session(42).await.unwrap().unwrap();
        assert_eq!(session.session, b"auth-session-state");
        assert!(session.webhook.is_none());

        let raw = queries::sessions::get_session(store.db(), 42)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(raw.enc_session, b"auth-session-state");
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn session_with_foreign_key_surfaces_corrupt_credential() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let db = Database::open(path.to_str().unwrap()).await.unwrap();
            let vault = CredentialVault::from_key(generate_random_key().unwrap());
            let store = SessionStore::new(db, vault);
            store.upsert_session(42, b"blob", None).await.unwrap();
            store.close().await.unwrap();
        }

        // Reopen with a different key: operator lost/rotated the vault key.
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let vault = CredentialVault::from_key(generate_random_key().unwrap());
        let store = SessionStore::new(db, vault);

        let result = store.get_session(42).await;
        assert!(matches!(result, Err(TelewatchError::CorruptCredential)));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn commit_login_consumes_pending_and_writes_session() {
        let (store, _dir) = setup().await;
        let attempt = store
            .upsert_pending(42, b"tmp", "+1", Some("h1"))
            .await
            .unwrap();

        let committed = store
            .commit_login(42, attempt, b"durable", Some("+1"))
            .await
            .unwrap();
        assert!(committed);
        assert!(store.get_pending(42).await.unwrap().is_none());
        assert_eq!(store.get_session(42).await.unwrap().unwrap().session, b"durable");
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_upserts_collapse_to_one_row() {
        let (store, _dir) = setup().await;
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert_pending(42, &[i], "+15551234567", Some("h"))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Exactly one pending row, with the epoch reflecting every write.
        let pending = store.get_pending(42).await.unwrap().unwrap();
        assert_eq!(pending.attempt_id, 8);
    }

    #[tokio::test]
    async fn webhook_whitespace_is_trimmed_to_none() {
        let (store, _dir) = setup().await;
        store.upsert_session(42, b"b", None).await.unwrap();
        queries::sessions::get_session(store.db(), 42).await.unwrap();
        // Default webhook is empty string -> None is covered above; a
        // whitespace-only value behaves the same.
        store
            .db()
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute("UPDATE sessions SET webhook = '   ' WHERE tg_id = 42", [])?;
                Ok(())
            })
            .await
            .unwrap();
        let session = store.get_session(42).await.unwrap().unwrap();
        assert!(session.webhook.is_none());
    }
}
