//! Query-string filters translated into a parameterised WHERE clause
//!
//! Column names always come from code; only values are bound as parameters.

use rusqlite::types::Value;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

/// LIMIT / OFFSET window for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Default)]
pub struct Filter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    fn compare(mut self, column: &str, op: &str, value: Option<Value>) -> Self {
        if let Some(value) = value {
            let idx = self.bind(value);
            self.clauses.push(format!("{} {} ?{}", column, op, idx));
        }
        self
    }

    /// `column = value` for any text-like value (ids, enum names)
    pub fn eq<V: AsRef<str>>(self, column: &str, value: Option<V>) -> Self {
        self.compare(column, "=", value.map(|v| Value::Text(v.as_ref().to_string())))
    }

    pub fn eq_bool(self, column: &str, value: Option<bool>) -> Self {
        self.compare(column, "=", value.map(|v| Value::Integer(v as i64)))
    }

    /// `column >= value`; ISO dates and RFC 3339 stamps order correctly as text
    pub fn gte<V: AsRef<str>>(self, column: &str, value: Option<V>) -> Self {
        self.compare(column, ">=", value.map(|v| Value::Text(v.as_ref().to_string())))
    }

    pub fn lte<V: AsRef<str>>(self, column: &str, value: Option<V>) -> Self {
        self.compare(column, "<=", value.map(|v| Value::Text(v.as_ref().to_string())))
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.clauses.push(format!("{} IS NULL", column));
        self
    }

    pub fn not_in(mut self, column: &str, values: &[&str]) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|v| format!("?{}", self.bind(Value::Text(v.to_string()))))
            .collect();
        self.clauses
            .push(format!("{} NOT IN ({})", column, placeholders.join(", ")));
        self
    }

    /// Case-insensitive substring match across several columns
    pub fn search(mut self, columns: &[&str], term: Option<&str>) -> Self {
        let term = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return self,
        };
        if columns.is_empty() {
            return self;
        }
        let escaped = term
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let idx = self.bind(Value::Text(format!("%{}%", escaped)));
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("lower({}) LIKE ?{} ESCAPE '\\'", c, idx))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        self
    }

    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Full statement: `SELECT {columns} FROM {table} [WHERE ..] ORDER BY .. [LIMIT ..]`
    pub fn select(&self, columns: &str, table: &str, order_by: &str, page: Option<Page>) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}{} ORDER BY {}",
            columns,
            table,
            self.where_clause(),
            order_by
        );
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.limit, page.offset));
        }
        sql
    }

    pub fn count(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}{}", table, self.where_clause())
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}
