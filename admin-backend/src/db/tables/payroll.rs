//! Payroll database operations

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::PayrollRecord;

const PAYROLL_COLUMNS: &str = "id, employee_id, period_start, period_end, base_salary, bonus, deductions, net_pay, \
                               status, paid_at, created_at, updated_at";

impl Database {
    pub fn insert_payroll(&self, record: &PayrollRecord) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO payroll (id, employee_id, period_start, period_end, base_salary, bonus, deductions, net_pay,
                status, paid_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                &record.id,
                &record.employee_id,
                columns::day(&record.period_start),
                columns::day(&record.period_end),
                record.base_salary,
                record.bonus,
                record.deductions,
                record.net_pay,
                record.status.as_ref(),
                columns::opt_ts(&record.paid_at),
                columns::ts(&record.created_at),
                columns::ts(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_payroll(&self, id: &str) -> SqliteResult<Option<PayrollRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM payroll WHERE id = ?1", PAYROLL_COLUMNS),
            [id],
            Self::row_to_payroll,
        )
        .optional()
    }

    pub fn list_payroll(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<PayrollRecord>> {
        self.select_payroll(filter, Some(page))
    }

    /// Every record matching `filter`, unpaged, for period summaries
    pub fn all_payroll(&self, filter: &Filter) -> SqliteResult<Vec<PayrollRecord>> {
        self.select_payroll(filter, None)
    }

    fn select_payroll(&self, filter: &Filter, page: Option<Page>) -> SqliteResult<Vec<PayrollRecord>> {
        let conn = self.conn.lock();
        let sql = filter.select(PAYROLL_COLUMNS, "payroll", "period_start DESC, created_at DESC", page);
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_payroll)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    pub fn save_payroll(&self, record: &PayrollRecord) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE payroll SET base_salary = ?1, bonus = ?2, deductions = ?3, net_pay = ?4, status = ?5,
                paid_at = ?6, updated_at = ?7
             WHERE id = ?8",
            rusqlite::params![
                record.base_salary,
                record.bonus,
                record.deductions,
                record.net_pay,
                record.status.as_ref(),
                columns::opt_ts(&record.paid_at),
                columns::ts(&record.updated_at),
                &record.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    pub fn delete_payroll(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM payroll WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn row_to_payroll(row: &rusqlite::Row) -> SqliteResult<PayrollRecord> {
        Ok(PayrollRecord {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            period_start: columns::date(row, 2)?,
            period_end: columns::date(row, 3)?,
            base_salary: row.get(4)?,
            bonus: row.get(5)?,
            deductions: row.get(6)?,
            net_pay: row.get(7)?,
            status: columns::enumeration(row, 8)?,
            paid_at: columns::opt_timestamp(row, 9)?,
            created_at: columns::timestamp(row, 10)?,
            updated_at: columns::timestamp(row, 11)?,
        })
    }
}
