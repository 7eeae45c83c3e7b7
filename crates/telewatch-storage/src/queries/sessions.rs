// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmed-session CRUD and filter-field partial updates.

use rusqlite::params;
use telewatch_core::TelewatchError;

use crate::database::{Database, map_tr_err};
use crate::models::{FilterField, SessionRow};

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<SessionRow, rusqlite::Error> {
    Ok(SessionRow {
        tg_id: row.get(0)?,
        enc_session: row.get(1)?,
        phone: row.get(2)?,
        keywords: row.get(3)?,
        negative: row.get(4)?,
        only_public: row.get::<_, i64>(5)? != 0,
        webhook: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Replace any existing session row for this user. Last write wins: a
/// re-login invalidates the prior blob and resets filter configuration.
pub async fn upsert_session(
    db: &Database,
    tg_id: i64,
    enc_session: Vec<u8>,
    phone: Option<String>,
    created_at: String,
) -> Result<(), TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "REPLACE INTO sessions (tg_id, enc_session, phone, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![tg_id, enc_session, phone, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the session row for a user, if any.
pub async fn get_session(db: &Database, tg_id: i64) -> Result<Option<SessionRow>, TelewatchError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT tg_id, enc_session, phone, keywords, negative, only_public, webhook, created_at
                 FROM sessions WHERE tg_id = ?1",
                params![tg_id],
                |row| row_to_session(row),
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

/// List all user ids with a confirmed session (monitor resumption at boot).
pub async fn session_user_ids(db: &Database) -> Result<Vec<i64>, TelewatchError> {
    db.connection()
        .call(|conn| -> Result<Vec<i64>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT tg_id FROM sessions ORDER BY tg_id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Partially update one filter column. Returns `false` (no-op) when the user
/// has no session row.
pub async fn update_filter(
    db: &Database,
    tg_id: i64,
    field: FilterField,
    value: String,
) -> Result<bool, TelewatchError> {
    let sql = format!("UPDATE sessions SET {} = ?2 WHERE tg_id = ?1", field.column());
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(&sql, params![tg_id, value])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Toggle public-chat-only matching. Returns `false` (no-op) when the user
/// has no session row.
pub async fn set_only_public(
    db: &Database,
    tg_id: i64,
    only_public: bool,
) -> Result<bool, TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE sessions SET only_public = ?2 WHERE tg_id = ?1",
                params![tg_id, only_public as i64],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Record a user's first interaction. Idempotent.
pub async fn touch_user(db: &Database, tg_id: i64, created_at: String) -> Result<(), TelewatchError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR IGNORE INTO users (tg_id, created_at) VALUES (?1, ?2)",
                params![tg_id, created_at],
            )?;
            Ok(())
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
    async fn upsert_and_get_roundtrips() {
        let (db, _dir) = setup_db().await;
        upsert_session(&db, 42, b"enc".to_vec(), Some("+1".into()), "c".into())
            .await
            .unwrap();

        let row = get_session(&db, 42).await.unwrap().unwrap();
        assert_eq!(row.enc_session, b"enc");
        assert_eq!(row.phone.as_deref(), Some("+1"));
        assert_eq!(row.keywords, "");
        assert_eq!(row.negative, "");
        assert!(!row.only_public);
        assert_eq!(row.webhook, "");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_session(&db, 1).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn relogin_replaces_blob_and_resets_filters() {
        let (db, _dir) = setup_db().await;
        upsert_session(&db, 42, b"old".to_vec(), Some("+1".into()), "c1".into())
            .await
            .unwrap();
        update_filter(&db, 42, FilterField::Keywords, "invoice".into())
            .await
            .unwrap();

        upsert_session(&db, 42, b"new".to_vec(), None, "c2".into())
            .await
            .unwrap();

        let row = get_session(&db, 42).await.unwrap().unwrap();
        assert_eq!(row.enc_session, b"new");
        assert!(row.phone.is_none());
        assert_eq!(row.keywords, "", "replace semantics reset the filter");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_filter_without_session_is_noop() {
        let (db, _dir) = setup_db().await;
        let updated = update_filter(&db, 42, FilterField::Negative, "spam".into())
            .await
            .unwrap();
        assert!(!updated);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_filter_touches_only_its_column() {
        let (db, _dir) = setup_db().await;
        upsert_session(&db, 42, b"enc".to_vec(), None, "c".into())
            .await
            .unwrap();

        assert!(
            update_filter(&db, 42, FilterField::Keywords, "invoice|payment".into())
                .await
                .unwrap()
        );
        assert!(
            update_filter(&db, 42, FilterField::Negative, "spam".into())
                .await
                .unwrap()
        );

        let row = get_session(&db, 42).await.unwrap().unwrap();
        assert_eq!(row.keywords, "invoice|payment");
        assert_eq!(row.negative, "spam");
        assert_eq!(row.enc_session, b"enc");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_only_public_flips_the_flag() {
        let (db, _dir) = setup_db().await;
        assert!(!set_only_public(&db, 42, true).await.unwrap());

        upsert_session(&db, 42, b"enc".to_vec(), None, "c".into())
            .await
            .unwrap();
        assert!(set_only_public(&db, 42, true).await.unwrap());
        assert!(get_session(&db, 42).await.unwrap().unwrap().only_public);
        assert!(set_only_public(&db, 42, false).await.unwrap());
        assert!(!get_session(&db, 42).await.unwrap().unwrap().only_public);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn session_user_ids_lists_all() {
        let (db, _dir) = setup_db().await;
        upsert_session(&db, 2, b"b".to_vec(), None, "c".into())
            .await
            .unwrap();
        upsert_session(&db, 1, b"a".to_vec(), None, "c".into())
            .await
            .unwrap();
        assert_eq!(session_user_ids(&db).await.unwrap(), vec![1, 2]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn touch_user_is_idempotent() {
        let (db, _dir) = setup_db().await;
        touch_user(&db, 42, "c1".into()).await.unwrap();
        touch_user(&db, 42, "c2".into()).await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }
}
