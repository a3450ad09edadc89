//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, in_memory, init)
//! - Schema creation
//!
//! All table operations live in the tables/ subdirectory.

use parking_lot::Mutex;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;

/// Main database wrapper, one connection serialised behind a mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!("Could not create database directory {:?}: {}", parent, e);
                }
            }
        }

        Self::from_connection(Connection::open(database_url)?)
    }

    /// Private in-memory database, used by tests and throwaway runs
    pub fn in_memory() -> SqliteResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqliteResult<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Cheap round trip used by the health endpoint
    pub fn ping(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))
    }

    /// Create all tables and indexes if they do not exist yet
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'employee',
                department TEXT,
                phone TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                id TEXT PRIMARY KEY,
                token TEXT UNIQUE NOT NULL,
                profile_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'todo',
                priority TEXT NOT NULL DEFAULT 'medium',
                assigned_to TEXT,
                created_by TEXT,
                due_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (assigned_to) REFERENCES profiles(id) ON DELETE SET NULL,
                FOREIGN KEY (created_by) REFERENCES profiles(id) ON DELETE SET NULL
            )",
            [],
        )?;

        // CRM pipeline
        conn.execute(
            "CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                contact_name TEXT,
                email TEXT,
                phone TEXT,
                stage TEXT NOT NULL DEFAULT 'new',
                value REAL NOT NULL DEFAULT 0,
                source TEXT,
                notes TEXT,
                owner_id TEXT,
                closed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES profiles(id) ON DELETE SET NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS payroll (
                id TEXT PRIMARY KEY,
                employee_id TEXT NOT NULL,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                base_salary REAL NOT NULL,
                bonus REAL NOT NULL DEFAULT 0,
                deductions REAL NOT NULL DEFAULT 0,
                net_pay REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                paid_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (employee_id) REFERENCES profiles(id) ON DELETE CASCADE
            )",
            [],
        )?;

        // One row per clock-in; clock_out stays NULL while the shift is open
        conn.execute(
            "CREATE TABLE IF NOT EXISTS attendance (
                id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL,
                work_date TEXT NOT NULL,
                clock_in TEXT NOT NULL,
                clock_out TEXT,
                duration_minutes INTEGER,
                status TEXT NOT NULL DEFAULT 'present',
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                subject TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                priority TEXT NOT NULL DEFAULT 'medium',
                requester_id TEXT NOT NULL,
                assignee_id TEXT,
                resolved_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (requester_id) REFERENCES profiles(id) ON DELETE CASCADE,
                FOREIGN KEY (assignee_id) REFERENCES profiles(id) ON DELETE SET NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS ticket_messages (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL,
                author_id TEXT,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE SET NULL
            )",
            [],
        )?;

        // Business verification requests
        conn.execute(
            "CREATE TABLE IF NOT EXISTS verifications (
                id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL,
                business_name TEXT NOT NULL,
                registration_number TEXT NOT NULL,
                document_url TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                reviewed_by TEXT,
                reviewed_at TEXT,
                rejection_reason TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE,
                FOREIGN KEY (reviewed_by) REFERENCES profiles(id) ON DELETE SET NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL,
                plan TEXT NOT NULL,
                amount REAL NOT NULL,
                billing_interval TEXT NOT NULL DEFAULT 'monthly',
                status TEXT NOT NULL DEFAULT 'active',
                current_period_end TEXT,
                canceled_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles(role);
             CREATE INDEX IF NOT EXISTS idx_auth_sessions_expires ON auth_sessions(expires_at);
             CREATE INDEX IF NOT EXISTS idx_tasks_assigned_to ON tasks(assigned_to);
             CREATE INDEX IF NOT EXISTS idx_leads_stage ON leads(stage);
             CREATE INDEX IF NOT EXISTS idx_payroll_employee ON payroll(employee_id, period_start);
             CREATE INDEX IF NOT EXISTS idx_attendance_profile_date ON attendance(profile_id, work_date);
             CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_one_open ON attendance(profile_id) WHERE clock_out IS NULL;
             CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
             CREATE INDEX IF NOT EXISTS idx_ticket_messages_ticket ON ticket_messages(ticket_id);
             CREATE INDEX IF NOT EXISTS idx_verifications_status ON verifications(status);
             CREATE INDEX IF NOT EXISTS idx_subscriptions_status ON subscriptions(status);",
        )?;

        Ok(())
    }
}
