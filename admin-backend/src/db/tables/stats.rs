//! Cross-table counts for the dashboard landing page

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter};
use crate::models::{
    billing_overview, DashboardStats, LeadStage, SubscriptionStatus, TaskStatus, TicketStatus, VerificationStatus,
};

fn count(conn: &Connection, table: &str, filter: Filter) -> SqliteResult<i64> {
    conn.query_row(
        &filter.count(table),
        rusqlite::params_from_iter(filter.params()),
        |row| row.get(0),
    )
}

impl Database {
    /// One COUNT per headline figure; MRR is folded from the subscriptions afterwards
    pub fn dashboard_stats(&self, today: NaiveDate) -> SqliteResult<DashboardStats> {
        let mut stats = {
            let conn = self.conn.lock();
            let closed_leads = [LeadStage::Won.as_ref(), LeadStage::Lost.as_ref()];
            let closed_tickets = [TicketStatus::Resolved.as_ref(), TicketStatus::Closed.as_ref()];

            DashboardStats {
                total_users: count(&conn, "profiles", Filter::new())?,
                active_users: count(&conn, "profiles", Filter::new().eq_bool("is_active", Some(true)))?,
                open_tasks: count(&conn, "tasks", Filter::new().not_in("status", &[TaskStatus::Done.as_ref()]))?,
                open_tickets: count(&conn, "tickets", Filter::new().not_in("status", &closed_tickets))?,
                pending_verifications: count(
                    &conn,
                    "verifications",
                    Filter::new().eq("status", Some(VerificationStatus::Pending)),
                )?,
                open_leads: count(&conn, "leads", Filter::new().not_in("stage", &closed_leads))?,
                won_leads: count(&conn, "leads", Filter::new().eq("stage", Some(LeadStage::Won)))?,
                attendance_today: conn.query_row(
                    "SELECT COUNT(DISTINCT profile_id) FROM attendance WHERE work_date = ?1",
                    [columns::day(&today)],
                    |row| row.get(0),
                )?,
                active_subscriptions: count(
                    &conn,
                    "subscriptions",
                    Filter::new().eq("status", Some(SubscriptionStatus::Active)),
                )?,
                mrr: 0.0,
                generated_at: columns::ts(&Utc::now()),
            }
        };

        // the lock above must be released before the next query takes it again
        stats.mrr = billing_overview(&self.all_subscriptions(&Filter::new())?).mrr;
        Ok(stats)
    }
}
