//! Profile database operations

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::{Profile, Role};

const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, department, phone, is_active, created_at, updated_at";

impl Database {
    pub fn create_profile(
        &self,
        email: &str,
        full_name: &str,
        role: Role,
        department: Option<&str>,
        phone: Option<&str>,
    ) -> SqliteResult<Profile> {
        let conn = self.conn.lock();
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            full_name: full_name.to_string(),
            role,
            department: department.map(str::to_string),
            phone: phone.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO profiles (id, email, full_name, role, department, phone, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
            rusqlite::params![
                &profile.id,
                &profile.email,
                &profile.full_name,
                profile.role.as_ref(),
                &profile.department,
                &profile.phone,
                columns::ts(&now),
            ],
        )?;

        Ok(profile)
    }

    pub fn get_profile(&self, id: &str) -> SqliteResult<Option<Profile>> {
        let conn = self.conn.lock();
        Self::fetch_profile(&conn, id)
    }

    pub(crate) fn fetch_profile(conn: &Connection, id: &str) -> SqliteResult<Option<Profile>> {
        conn.query_row(
            &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
            [id],
            Self::row_to_profile,
        )
        .optional()
    }

    pub fn list_profiles(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<Profile>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&filter.select(PROFILE_COLUMNS, "profiles", "full_name COLLATE NOCASE", Some(page)))?;
        let profiles = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_profile)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(profiles)
    }

    /// Write every mutable column of an already-loaded profile back
    pub fn save_profile(&self, profile: &Profile) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE profiles SET full_name = ?1, role = ?2, department = ?3, phone = ?4, is_active = ?5, updated_at = ?6
             WHERE id = ?7",
            rusqlite::params![
                &profile.full_name,
                profile.role.as_ref(),
                &profile.department,
                &profile.phone,
                profile.is_active,
                columns::ts(&profile.updated_at),
                &profile.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    pub fn delete_profile(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM profiles WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn row_to_profile(row: &rusqlite::Row) -> SqliteResult<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            role: columns::enumeration(row, 3)?,
            department: row.get(4)?,
            phone: row.get(5)?,
            is_active: columns::flag(row, 6)?,
            created_at: columns::timestamp(row, 7)?,
            updated_at: columns::timestamp(row, 8)?,
        })
    }
}
