//! Table modules - extend Database with per-table methods
//!
//! Each module adds `impl Database` blocks for one table group.

mod attendance;    // attendance (clock-in / clock-out)
mod auth;          // auth_sessions
mod leads;         // leads (CRM pipeline)
mod payroll;       // payroll
mod profiles;      // profiles
mod stats;         // cross-table dashboard counts
mod subscriptions; // subscriptions (billing)
mod tasks;         // tasks
mod tickets;       // tickets, ticket_messages
mod verifications; // verifications

use rusqlite::Result as SqliteResult;

/// "single row" semantics: a missing row is the store's not-found error
pub trait Required<T> {
    fn required(self) -> SqliteResult<T>;
}

impl<T> Required<T> for SqliteResult<Option<T>> {
    fn required(self) -> SqliteResult<T> {
        self?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }
}

#[cfg(test)]
pub mod test_support {
    use crate::db::Database;
    use crate::models::{Profile, Role};

    pub fn seed_profile(db: &Database, email: &str, role: Role) -> Profile {
        let name = email.split('@').next().unwrap_or(email);
        db.create_profile(email, &format!("{} Tester", name), role, None, None)
            .unwrap()
    }
}
