//! Task database operations

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::columns;
use super::super::{Database, Filter, Page};
use crate::models::Task;

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, assigned_to, created_by, due_date, created_at, updated_at";

impl Database {
    pub fn insert_task(&self, task: &Task) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, assigned_to, created_by, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &task.id,
                &task.title,
                &task.description,
                task.status.as_ref(),
                task.priority.as_ref(),
                &task.assigned_to,
                &task.created_by,
                columns::opt_day(&task.due_date),
                columns::ts(&task.created_at),
                columns::ts(&task.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> SqliteResult<Option<Task>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            [id],
            Self::row_to_task,
        )
        .optional()
    }

    /// Newest first
    pub fn list_tasks(&self, filter: &Filter, page: Page) -> SqliteResult<Vec<Task>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&filter.select(TASK_COLUMNS, "tasks", "created_at DESC", Some(page)))?;
        let tasks = stmt
            .query_map(rusqlite::params_from_iter(filter.params()), Self::row_to_task)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn save_task(&self, task: &Task) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, status = ?3, priority = ?4, assigned_to = ?5,
                due_date = ?6, updated_at = ?7
             WHERE id = ?8",
            rusqlite::params![
                &task.title,
                &task.description,
                task.status.as_ref(),
                task.priority.as_ref(),
                &task.assigned_to,
                columns::opt_day(&task.due_date),
                columns::ts(&task.updated_at),
                &task.id,
            ],
        )?;
        if rows == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    pub fn delete_task(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn row_to_task(row: &rusqlite::Row) -> SqliteResult<Task> {
        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: columns::enumeration(row, 3)?,
            priority: columns::enumeration(row, 4)?,
            assigned_to: row.get(5)?,
            created_by: row.get(6)?,
            due_date: columns::opt_date(row, 7)?,
            created_at: columns::timestamp(row, 8)?,
            updated_at: columns::timestamp(row, 9)?,
        })
    }
}
