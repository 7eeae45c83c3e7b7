// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRUD for in-flight login attempts, plus the attempt-epoch commit.
//!
//! Every rewrite of a pending row bumps `attempt_id`; the login commit
//! deletes the row only if the caller still holds the current epoch. That
//! closes the race where a `resend` overwrites the code hash while an
//! earlier `confirm_code` is still awaiting the remote reply.

use rusqlite::params;
use telewatch_core::TelewatchError;

use crate::database::{Database, map_tr_err};
use crate::models::PendingRow;

/// Replace any existing pending row for this user and return the new
/// attempt epoch. REPLACE semantics: a fresh `/phone` supersedes, never
/// merges.
pub async fn upsert_pending(
    db: &Database,
    tg_id: i64,
    tmp_enc_session: Vec<u8>,
    phone: String,
    code_hash: Option<String>,
    sent_at: String,
) -> Result<i64, TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            let tx = conn.transaction()?;
            let prev: Option<i64> = tx
                .query_row(
                    "SELECT attempt_id FROM pending WHERE tg_id = ?1",
                    params![tg_id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            let attempt_id = prev.unwrap_or(0) + 1;
            tx.execute(
                "REPLACE INTO pending (tg_id, tmp_enc_session, phone, code_hash, attempt_id, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![tg_id, tmp_enc_session, phone, code_hash, attempt_id, sent_at],
            )?;
            tx.commit()?;
            Ok(attempt_id)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the connection blob, code hash, and sent_at of an existing
/// pending row, bumping its attempt epoch. Returns the new epoch, or `None`
/// when no pending row exists.
pub async fn refresh_code(
    db: &Database,
    tg_id: i64,
    tmp_enc_session: Vec<u8>,
    code_hash: String,
    sent_at: String,
) -> Result<Option<i64>, TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE pending
                 SET tmp_enc_session = ?2, code_hash = ?3, sent_at = ?4,
                     attempt_id = attempt_id + 1
                 WHERE tg_id = ?1",
                params![tg_id, tmp_enc_session, code_hash, sent_at],
            )?;
            if changed == 0 {
                tx.commit()?;
                return Ok(None);
            }
            let attempt_id: i64 = tx.query_row(
                "SELECT attempt_id FROM pending WHERE tg_id = ?1",
                params![tg_id],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok(Some(attempt_id))
        })
        .await
        .map_err(map_tr_err)
}

/// Get the pending row for a user, if any.
pub async fn get_pending(db: &Database, tg_id: i64) -> Result<Option<PendingRow>, TelewatchError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT tg_id, tmp_enc_session, phone, code_hash, attempt_id, sent_at
                 FROM pending WHERE tg_id = ?1",
                params![tg_id],
                |row| {
                    Ok(PendingRow {
                        tg_id: row.get(0)?,
                        tmp_enc_session: row.get(1)?,
                        phone: row.get(2)?,
                        code_hash: row.get(3)?,
                        attempt_id: row.get(4)?,
                        sent_at: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the pending row for a user (abandonment).
pub async fn delete_pending(db: &Database, tg_id: i64) -> Result<(), TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM pending WHERE tg_id = ?1", params![tg_id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically finish a login: delete the pending row iff it still carries
/// `attempt_id`, then replace the confirmed session row. Returns `false`
/// (nothing written) when a newer attempt superseded this one mid-flight.
pub async fn commit_login(
    db: &Database,
    tg_id: i64,
    attempt_id: i64,
    enc_session: Vec<u8>,
    phone: Option<String>,
    created_at: String,
) -> Result<bool, TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let deleted = tx.execute(
                "DELETE FROM pending WHERE tg_id = ?1 AND attempt_id = ?2",
                params![tg_id, attempt_id],
            )?;
            if deleted == 0 {
                // Superseded by a newer attempt; commit nothing.
                return Ok(false);
            }
            tx.execute(
                "REPLACE INTO sessions (tg_id, enc_session, phone, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![tg_id, enc_session, phone, created_at],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces_with_bumped_epoch() {
        let (db, _dir) = setup_db().await;

        let a1 = upsert_pending(
            &db,
            42,
            b"blob-1".to_vec(),
            "+15551234567".into(),
            Some("h1".into()),
            "2026-01-01T00:00:00Z".into(),
        )
        .await
        .unwrap();
        assert_eq!(a1, 1);

        let a2 = upsert_pending(
            &db,
            42,
            b"blob-2".to_vec(),
            "+15551234567".into(),
            Some("h2".into()),
            "2026-01-01T00:01:00Z".into(),
        )
        .await
        .unwrap();
        assert_eq!(a2, 2);

        let row = get_pending(&db, 42).await.unwrap().unwrap();
        assert_eq!(row.tmp_enc_session, b"blob-2");
        assert_eq!(row.code_hash.as_deref(), Some("h2"));
        assert_eq!(row.attempt_id, 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn refresh_bumps_epoch_and_overwrites_hash() {
        let (db, _dir) = setup_db().await;
        upsert_pending(&db, 7, b"t".to_vec(), "+1".into(), Some("old".into()), "s".into())
            .await
            .unwrap();

        let epoch = refresh_code(&db, 7, b"t2".to_vec(), "new".into(), "s2".into())
            .await
            .unwrap();
        assert_eq!(epoch, Some(2));

        let row = get_pending(&db, 7).await.unwrap().unwrap();
        assert_eq!(row.code_hash.as_deref(), Some("new"));
        assert_eq!(row.sent_at, "s2");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn refresh_without_pending_returns_none() {
        let (db, _dir) = setup_db().await;
        let epoch = refresh_code(&db, 7, b"t".to_vec(), "h".into(), "s".into())
            .await
            .unwrap();
        assert!(epoch.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn commit_login_with_current_epoch_moves_row() {
        let (db, _dir) = setup_db().await;
        let attempt =
            upsert_pending(&db, 42, b"t".to_vec(), "+1".into(), Some("h".into()), "s".into())
                .await
                .unwrap();

        let committed = commit_login(
            &db,
            42,
            attempt,
            b"enc-session".to_vec(),
            Some("+1".into()),
            "c".into(),
        )
        .await
        .unwrap();
        assert!(committed);
        assert!(get_pending(&db, 42).await.unwrap().is_none());

        let session = crate::queries::sessions::get_session(&db, 42)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.enc_session, b"enc-session");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn commit_login_with_stale_epoch_writes_nothing() {
        let (db, _dir) = setup_db().await;
        upsert_pending(&db, 42, b"t".to_vec(), "+1".into(), Some("h1".into()), "s".into())
            .await
            .unwrap();
        // A resend bumps the epoch to 2 while the confirm still holds 1.
        refresh_code(&db, 42, b"t".to_vec(), "h2".into(), "s2".into())
            .await
            .unwrap();

        let committed = commit_login(&db, 42, 1, b"stale".to_vec(), None, "c".into())
            .await
            .unwrap();
        assert!(!committed);
        // Pending row survives, no session was written.
        assert!(get_pending(&db, 42).await.unwrap().is_some());
        assert!(
            crate::queries::sessions::get_session(&db, 42)
                .await
                .unwrap()
                .is_none()
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_pending_is_idempotent() {
        let (db, _dir) = setup_db().await;
        delete_pending(&db, 999).await.unwrap();
        upsert_pending(&db, 999, b"t".to_vec(), "+1".into(), None, "s".into())
            .await
            .unwrap();
        delete_pending(&db, 999).await.unwrap();
        assert!(get_pending(&db, 999).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
