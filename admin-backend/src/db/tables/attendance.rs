//! Attendance database operations

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::{AttendanceRecord, AttendanceStatus, AttendanceTotals};

const ATTENDANCE_COLUMNS: &str = "id, profile_id, work_date, clock_in, clock_out, duration_minutes, status, notes, \
                                  created_at, updated_at";

impl Database {
    pub fn insert_attendance(&self, record: &AttendanceRecord) -> SqliteResult<()> {
        let conn = self.conn.lock();
        Self::insert_attendance_row(&conn, record)
    }

    /// Open a shift unless the profile already has one; false when one is open
    pub fn start_shift(&self, record: &AttendanceRecord) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        if Self::open_shift(&conn, &record.profile_id)?.is_some() {
            return Ok(false);
        }
        match Self::insert_attendance_row(&conn, record) {
            Ok(()) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn insert_attendance_row(conn: &Connection, record: &AttendanceRecord) -> SqliteResult<()> {
        conn.execute(
            "INSERT INTO attendance (id, profile_id, work_date, clock_in, clock_out, duration_minutes, status, notes,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &record.id,
                &record.profile_id,
                columns::day(&record.work_date),
                columns::ts(&record.clock_in),
                columns::opt_ts(&record.clock_out),
                record.duration_minutes,
                record.status.as_ref(),
                &record.notes,
                columns::ts(&record.created_at),
                columns::ts(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_attendance(&self, id: &str) -> SqliteResult<Option<AttendanceRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM attendance WHERE id = ?1", ATTENDANCE_COLUMNS),
            [id],
            Self::row_to_attendance,
        )
        .optional()
    }

    /// The caller's shift that has no clock_out yet
    pub fn open_attendance_for(&self, profile_id: &str) -> SqliteResult<Option<AttendanceRecord>> {
        let conn = self.conn.lock();
        Self::open_shift(&conn, profile_id)
    }

    fn open_shift(conn: &Connection, profile_id: &str) -> SqliteResult<Option<AttendanceRecord>> {
        let filter = Filter::new().eq("profile_id", Some(profile_id)).is_null("clock_out");
        let sql = filter.select(ATTENDANCE_COLUMNS, "attendance", "clock_in DESC", Some(Page::new(Some(1), None)));
        conn.query_row(&sql, rusqlite::params_from_iter(filter.params()), Self::row_to_attendance)
            .optional()
    }

    pub fn list_attendance(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<AttendanceRecord>> {
        let conn = self.conn.lock();
        let sql = filter.select(ATTENDANCE_COLUMNS, "attendance", "clock_in DESC", Some(page));
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_attendance)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    pub fn save_attendance(&self, record: &AttendanceRecord) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE attendance SET work_date = ?1, clock_in = ?2, clock_out = ?3, duration_minutes = ?4, status = ?5,
                notes = ?6, updated_at = ?7
             WHERE id = ?8",
            rusqlite::params![
                columns::day(&record.work_date),
                columns::ts(&record.clock_in),
                columns::opt_ts(&record.clock_out),
                record.duration_minutes,
                record.status.as_ref(),
                &record.notes,
                columns::ts(&record.updated_at),
                &record.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    /// Per-profile totals over the rows matching `filter`; profiles are left unembedded
    pub fn attendance_totals(&self, filter: &Filter) -> SqliteResult<Vec<AttendanceTotals>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT profile_id, COUNT(DISTINCT work_date), COALESCE(SUM(duration_minutes), 0),
                    SUM(CASE WHEN status = '{}' THEN 1 ELSE 0 END)
             FROM attendance{} GROUP BY profile_id ORDER BY profile_id",
            AttendanceStatus::Late,
            filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let totals = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), |row| {
                Ok(AttendanceTotals {
                    profile_id: row.get(0)?,
                    days: row.get(1)?,
                    total_minutes: row.get(2)?,
                    late_count: row.get(3)?,
                    profile: None,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(totals)
    }

    fn row_to_attendance(row: &rusqlite::Row) -> SqliteResult<AttendanceRecord> {
        Ok(AttendanceRecord {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            work_date: columns::date(row, 2)?,
            clock_in: columns::timestamp(row, 3)?,
            clock_out: columns::opt_timestamp(row, 4)?,
            duration_minutes: row.get(5)?,
            status: columns::enumeration(row, 6)?,
            notes: row.get(7)?,
            created_at: columns::timestamp(row, 8)?,
            updated_at: columns::timestamp(row, 9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_profile;
    use crate::models::Role;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_open_shift_lookup_and_close() {
        let db = Database::in_memory().unwrap();
        let emp = seed_profile(&db, "emp@example.com", Role::Employee);
        assert!(db.open_attendance_for(&emp.id).unwrap().is_none());

        let start = Utc.with_ymd_and_hms(2026, 3, 2, 8, 50, 0).unwrap();
        db.insert_attendance(&AttendanceRecord::open(&emp.id, start, 9, 15)).unwrap();

        let mut open = db.open_attendance_for(&emp.id).unwrap().unwrap();
        assert_eq!(open.status, AttendanceStatus::Present);
        open.close(start + Duration::minutes(480));
        db.save_attendance(&open).unwrap();

        assert!(db.open_attendance_for(&emp.id).unwrap().is_none());
        let closed = db.get_attendance(&open.id).unwrap().unwrap();
        assert_eq!(closed.duration_minutes, Some(480));
        assert_eq!(closed.clock_out, open.clock_out);
    }

    #[test]
    fn test_only_one_open_shift_per_profile() {
        let db = Database::in_memory().unwrap();
        let emp = seed_profile(&db, "emp@example.com", Role::Employee);
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        assert!(db.start_shift(&AttendanceRecord::open(&emp.id, start, 9, 15)).unwrap());
        assert!(!db.start_shift(&AttendanceRecord::open(&emp.id, start, 9, 15)).unwrap());

        // the index holds even when the lookup is bypassed
        let raced = db.insert_attendance(&AttendanceRecord::open(&emp.id, start, 9, 15));
        assert!(raced.is_err());

        let mut open = db.open_attendance_for(&emp.id).unwrap().unwrap();
        open.close(start + Duration::minutes(60));
        db.save_attendance(&open).unwrap();
        assert!(db.open_attendance_for(&emp.id).unwrap().is_none());

        let later = start + Duration::hours(2);
        assert!(db.start_shift(&AttendanceRecord::open(&emp.id, later, 9, 15)).unwrap());
        assert_eq!(db.list_attendance(&Filter::new(), Page::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_totals_by_profile_and_range() {
        let db = Database::in_memory().unwrap();
        let amy = seed_profile(&db, "amy@example.com", Role::Employee);
        let ben = seed_profile(&db, "ben@example.com", Role::Employee);

        let shift = |profile_id: &str, day: u32, hour: u32, minutes: i64| {
            let start = Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap();
            let mut record = AttendanceRecord::open(profile_id, start, 9, 15);
            record.close(start + Duration::minutes(minutes));
            db.insert_attendance(&record).unwrap();
        };
        shift(&amy.id, 2, 9, 480);
        shift(&amy.id, 3, 10, 420);
        shift(&amy.id, 9, 9, 480);
        shift(&ben.id, 3, 9, 300);

        let week = Filter::new()
            .gte("work_date", Some("2026-03-02"))
            .lte("work_date", Some("2026-03-06"));
        let totals = db.attendance_totals(&week).unwrap();
        assert_eq!(totals.len(), 2);

        let amy_totals = totals.iter().find(|t| t.profile_id == amy.id).unwrap();
        assert_eq!(amy_totals.days, 2);
        assert_eq!(amy_totals.total_minutes, 900);
        assert_eq!(amy_totals.late_count, 1);

        let listed = db
            .list_attendance(&week.eq("profile_id", Some(&ben.id)), Page::default())
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_open_shift_counts_zero_minutes() {
        let db = Database::in_memory().unwrap();
        let emp = seed_profile(&db, "emp@example.com", Role::Employee);
        db.insert_attendance(&AttendanceRecord::open(&emp.id, Utc::now(), 9, 15)).unwrap();

        let totals = db.attendance_totals(&Filter::new()).unwrap();
        assert_eq!(totals[0].days, 1);
        assert_eq!(totals[0].total_minutes, 0);
    }
}
