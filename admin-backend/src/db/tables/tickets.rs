//! Ticket and ticket message database operations

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::{Ticket, TicketMessage};

const TICKET_COLUMNS: &str = "id, subject, description, status, priority, requester_id, assignee_id, resolved_at, \
                              created_at, updated_at";

impl Database {
    pub fn insert_ticket(&self, ticket: &Ticket) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tickets (id, subject, description, status, priority, requester_id, assignee_id, resolved_at,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &ticket.id,
                &ticket.subject,
                &ticket.description,
                ticket.status.as_ref(),
                ticket.priority.as_ref(),
                &ticket.requester_id,
                &ticket.assignee_id,
                columns::opt_ts(&ticket.resolved_at),
                columns::ts(&ticket.created_at),
                columns::ts(&ticket.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_ticket(&self, id: &str) -> SqliteResult<Option<Ticket>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS),
            [id],
            Self::row_to_ticket,
        )
        .optional()
    }

    pub fn list_tickets(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<Ticket>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&filter.select(TICKET_COLUMNS, "tickets", "created_at DESC", Some(page)))?;
        let tickets = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_ticket)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tickets)
    }

    pub fn save_ticket(&self, ticket: &Ticket) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE tickets SET status = ?1, priority = ?2, assignee_id = ?3, resolved_at = ?4, updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                ticket.status.as_ref(),
                ticket.priority.as_ref(),
                &ticket.assignee_id,
                columns::opt_ts(&ticket.resolved_at),
                columns::ts(&ticket.updated_at),
                &ticket.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    /// Messages go with the ticket through the cascading foreign key
    pub fn delete_ticket(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM tickets WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    pub fn insert_ticket_message(&self, message: &TicketMessage) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO ticket_messages (id, ticket_id, author_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                &message.id,
                &message.ticket_id,
                &message.author_id,
                &message.body,
                columns::ts(&message.created_at),
            ],
        )?;
        Ok(())
    }

    /// Conversation in the order it was written
    pub fn list_ticket_messages(&self, ticket_id: &str) -> SqliteResult<Vec<TicketMessage>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, author_id, body, created_at FROM ticket_messages
             WHERE ticket_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let messages = stmt
            .query_map([ticket_id], |row| {
                Ok(TicketMessage {
                    id: row.get(0)?,
                    ticket_id: row.get(1)?,
                    author_id: row.get(2)?,
                    body: row.get(3)?,
                    created_at: columns::timestamp(row, 4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(messages)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> SqliteResult<Ticket> {
        Ok(Ticket {
            id: row.get(0)?,
            subject: row.get(1)?,
            description: row.get(2)?,
            status: columns::enumeration(row, 3)?,
            priority: columns::enumeration(row, 4)?,
            requester_id: row.get(5)?,
            assignee_id: row.get(6)?,
            resolved_at: columns::opt_timestamp(row, 7)?,
            created_at: columns::timestamp(row, 8)?,
            updated_at: columns::timestamp(row, 9)?,
        })
    }
}
