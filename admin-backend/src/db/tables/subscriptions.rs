//! Subscription database operations

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::Subscription;

const SUBSCRIPTION_COLUMNS: &str = "id, profile_id, plan, amount, billing_interval, status, current_period_end, \
                                    canceled_at, created_at, updated_at";

impl Database {
    pub fn insert_subscription(&self, subscription: &Subscription) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO subscriptions (id, profile_id, plan, amount, billing_interval, status, current_period_end,
                canceled_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &subscription.id,
                &subscription.profile_id,
                &subscription.plan,
                subscription.amount,
                subscription.billing_interval.as_ref(),
                subscription.status.as_ref(),
                columns::opt_day(&subscription.current_period_end),
                columns::opt_ts(&subscription.canceled_at),
                columns::ts(&subscription.created_at),
                columns::ts(&subscription.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_subscription(&self, id: &str) -> SqliteResult<Option<Subscription>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLUMNS),
            [id],
            Self::row_to_subscription,
        )
        .optional()
    }

    pub fn list_subscriptions(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<Subscription>> {
        self.select_subscriptions(filter, Some(page))
    }

    /// Every subscription matching `filter`, unpaged, for revenue figures
    pub fn all_subscriptions(&self, filter: &Filter) -> SqliteResult<Vec<Subscription>> {
        self.select_subscriptions(filter, None)
    }

    fn select_subscriptions(&self, filter: &Filter, page: Option<Page>) -> SqliteResult<Vec<Subscription>> {
        let conn = self.conn.lock();
        let sql = filter.select(SUBSCRIPTION_COLUMNS, "subscriptions", "created_at DESC", page);
        let mut stmt = conn.prepare(&sql)?;
        let subscriptions = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_subscription)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(subscriptions)
    }

    pub fn save_subscription(&self, subscription: &Subscription) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE subscriptions SET plan = ?1, amount = ?2, billing_interval = ?3, status = ?4,
                current_period_end = ?5, canceled_at = ?6, updated_at = ?7
             WHERE id = ?8",
            rusqlite::params![
                &subscription.plan,
                subscription.amount,
                subscription.billing_interval.as_ref(),
                subscription.status.as_ref(),
                columns::opt_day(&subscription.current_period_end),
                columns::opt_ts(&subscription.canceled_at),
                columns::ts(&subscription.updated_at),
                &subscription.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    fn row_to_subscription(row: &rusqlite::Row) -> SqliteResult<Subscription> {
        Ok(Subscription {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            plan: row.get(2)?,
            amount: row.get(3)?,
            billing_interval: columns::enumeration(row, 4)?,
            status: columns::enumeration(row, 5)?,
            current_period_end: columns::opt_date(row, 6)?,
            canceled_at: columns::opt_timestamp(row, 7)?,
            created_at: columns::timestamp(row, 8)?,
            updated_at: columns::timestamp(row, 9)?,
        })
    }
}
