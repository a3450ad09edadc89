//! Auth session database operations

use chrono::{Duration, Utc};
use rand::RngCore;
use rusqlite::{OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::columns;
use super::super::Database;
use crate::models::Session;

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Database {
    /// Issue a new session for a profile, purging expired ones on the way
    pub fn create_session(&self, profile_id: &str, ttl_hours: i64) -> SqliteResult<Session> {
        let conn = self.conn.lock();
        let now = Utc::now();

        let purged = conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at < ?1",
            [columns::ts(&now)],
        )?;
        if purged > 0 {
            log::debug!("Purged {} expired sessions", purged);
        }

        let expires_at = Duration::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                let msg = format!("session TTL of {} hours is out of range", ttl_hours);
                rusqlite::Error::ToSqlConversionFailure(msg.into())
            })?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            token: generate_token(),
            profile_id: profile_id.to_string(),
            created_at: now,
            expires_at,
        };

        conn.execute(
            "INSERT INTO auth_sessions (id, token, profile_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                &session.id,
                &session.token,
                &session.profile_id,
                columns::ts(&session.created_at),
                columns::ts(&session.expires_at),
            ],
        )?;

        Ok(session)
    }

    /// Look up an unexpired session by token
    pub fn validate_session(&self, token: &str) -> SqliteResult<Option<Session>> {
        let conn = self.conn.lock();
        let now = columns::ts(&Utc::now());

        conn.query_row(
            "SELECT id, token, profile_id, created_at, expires_at FROM auth_sessions
             WHERE token = ?1 AND expires_at > ?2",
            [token, now.as_str()],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token: row.get(1)?,
                    profile_id: row.get(2)?,
                    created_at: columns::timestamp(row, 3)?,
                    expires_at: columns::timestamp(row, 4)?,
                })
            },
        )
        .optional()
    }

    pub fn delete_session(&self, token: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows > 0)
    }
}
