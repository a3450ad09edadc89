//! Lead database operations

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::Lead;

const LEAD_COLUMNS: &str = "id, company_name, contact_name, email, phone, stage, value, source, notes, owner_id, \
                            closed_at, created_at, updated_at";

impl Database {
    pub fn insert_lead(&self, lead: &Lead) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO leads (id, company_name, contact_name, email, phone, stage, value, source, notes, owner_id,
                closed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                &lead.id,
                &lead.company_name,
                &lead.contact_name,
                &lead.email,
                &lead.phone,
                lead.stage.as_ref(),
                lead.value,
                &lead.source,
                &lead.notes,
                &lead.owner_id,
                columns::opt_ts(&lead.closed_at),
                columns::ts(&lead.created_at),
                columns::ts(&lead.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_lead(&self, id: &str) -> SqliteResult<Option<Lead>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS),
            [id],
            Self::row_to_lead,
        )
        .optional()
    }

    pub fn list_leads(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<Lead>> {
        self.select_leads(filter, Some(page))
    }

    /// Every lead matching `filter`, unpaged, for pipeline aggregation
    pub fn all_leads(&self, filter: &Filter) -> SqliteResult<Vec<Lead>> {
        self.select_leads(filter, None)
    }

    fn select_leads(&self, filter: &Filter, page: Option<Page>) -> SqliteResult<Vec<Lead>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&filter.select(LEAD_COLUMNS, "leads", "created_at DESC", page))?;
        let leads = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_lead)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(leads)
    }

    pub fn save_lead(&self, lead: &Lead) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE leads SET company_name = ?1, contact_name = ?2, email = ?3, phone = ?4, stage = ?5, value = ?6,
                source = ?7, notes = ?8, owner_id = ?9, closed_at = ?10, updated_at = ?11
             WHERE id = ?12",
            rusqlite::params![
                &lead.company_name,
                &lead.contact_name,
                &lead.email,
                &lead.phone,
                lead.stage.as_ref(),
                lead.value,
                &lead.source,
                &lead.notes,
                &lead.owner_id,
                columns::opt_ts(&lead.closed_at),
                columns::ts(&lead.updated_at),
                &lead.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    pub fn delete_lead(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM leads WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn row_to_lead(row: &rusqlite::Row) -> SqliteResult<Lead> {
        Ok(Lead {
            id: row.get(0)?,
            company_name: row.get(1)?,
            contact_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            stage: columns::enumeration(row, 5)?,
            value: row.get(6)?,
            source: row.get(7)?,
            notes: row.get(8)?,
            owner_id: row.get(9)?,
            closed_at: columns::opt_timestamp(row, 10)?,
            created_at: columns::timestamp(row, 11)?,
            updated_at: columns::timestamp(row, 12)?,
        })
    }
}
