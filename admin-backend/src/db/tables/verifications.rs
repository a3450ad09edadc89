//! Business verification database operations

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::Verification;

const VERIFICATION_COLUMNS: &str = "id, profile_id, business_name, registration_number, document_url, status, \
                                    reviewed_by, reviewed_at, rejection_reason, created_at, updated_at";

impl Database {
    pub fn insert_verification(&self, verification: &Verification) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO verifications (id, profile_id, business_name, registration_number, document_url, status,
                reviewed_by, reviewed_at, rejection_reason, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                &verification.id,
                &verification.profile_id,
                &verification.business_name,
                &verification.registration_number,
                &verification.document_url,
                verification.status.as_ref(),
                &verification.reviewed_by,
                columns::opt_ts(&verification.reviewed_at),
                &verification.rejection_reason,
                columns::ts(&verification.created_at),
                columns::ts(&verification.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_verification(&self, id: &str) -> SqliteResult<Option<Verification>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM verifications WHERE id = ?1", VERIFICATION_COLUMNS),
            [id],
            Self::row_to_verification,
        )
        .optional()
    }

    pub fn list_verifications(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<Verification>> {
        let conn = self.conn.lock();
        let sql = filter.select(VERIFICATION_COLUMNS, "verifications", "created_at DESC", Some(page));
        let mut stmt = conn.prepare(&sql)?;
        let verifications = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_verification)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(verifications)
    }

    pub fn save_verification(&self, verification: &Verification) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE verifications SET status = ?1, reviewed_by = ?2, reviewed_at = ?3, rejection_reason = ?4,
                updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                verification.status.as_ref(),
                &verification.reviewed_by,
                columns::opt_ts(&verification.reviewed_at),
                &verification.rejection_reason,
                columns::ts(&verification.updated_at),
                &verification.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    fn row_to_verification(row: &rusqlite::Row) -> SqliteResult<Verification> {
        Ok(Verification {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            business_name: row.get(2)?,
            registration_number: row.get(3)?,
            document_url: row.get(4)?,
            status: columns::enumeration(row, 5)?,
            reviewed_by: row.get(6)?,
            reviewed_at: columns::opt_timestamp(row, 7)?,
            rejection_reason: row.get(8)?,
            created_at: columns::timestamp(row, 9)?,
            updated_at: columns::timestamp(row, 10)?,
        })
    }
}
