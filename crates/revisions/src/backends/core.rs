//! Core Database Backend Traits
//!
//! The engine talks to a database only through [`DatabaseConnection`], so the
//! driver underneath can be sqlx or a test double. Statements are issued one
//! at a time over a single connection.

use async_trait::async_trait;

use crate::error::{RevisionError, RevisionResult};

/// Minimal statement capability of a database connection
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Execute a statement and return the affected row count
    ///
    /// With no parameters the text is sent unprepared, so it may hold
    /// several statements.
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> RevisionResult<u64>;

    /// Execute a query and return all result rows
    async fn fetch_all(
        &mut self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> RevisionResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row, if any
    async fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> RevisionResult<Option<Box<dyn DatabaseRow>>>;

    /// Close the connection
    async fn close(self: Box<Self>) -> RevisionResult<()>;
}

/// A single result row
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> RevisionResult<DatabaseValue>;

    /// Get column count
    fn column_count(&self) -> usize;
}

/// Extension helpers for typed column access
pub trait DatabaseRowExt {
    fn get_string(&self, index: usize) -> RevisionResult<String>;

    fn get_i64(&self, index: usize) -> RevisionResult<i64>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get_string(&self, index: usize) -> RevisionResult<String> {
        match self.get_by_index(index)? {
            DatabaseValue::String(s) => Ok(s),
            other => Err(RevisionError::Database(format!(
                "column {} is not text: {:?}",
                index, other
            ))),
        }
    }

    fn get_i64(&self, index: usize) -> RevisionResult<i64> {
        match self.get_by_index(index)? {
            DatabaseValue::Int64(i) => Ok(i),
            other => Err(RevisionError::Database(format!(
                "column {} is not an integer: {:?}",
                index, other
            ))),
        }
    }
}

/// Parameter and column values used by the revision log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseValue {
    Null,
    Int64(i64),
    String(String),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// Outcome of creating the log table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The table was created by this call
    Created,
    /// The table was already there
    AlreadyInitialized,
}

/// Dialect-specific behaviour of a database type
#[async_trait]
pub trait Dialect: Send + Sync {
    /// Rewrite `?` markers into the dialect's placeholder syntax
    ///
    /// Must be a pure text transform.
    fn parameterize(&self, sql: &str) -> String;

    /// Create the revision log table
    ///
    /// An existing table is reported as [`SchemaStatus::AlreadyInitialized`];
    /// any other failure is returned.
    async fn init_schema(&self, conn: &mut dyn DatabaseConnection) -> RevisionResult<SchemaStatus>;
}

/// Run a `CREATE TABLE` and map "already exists" failures to a soft status
pub async fn create_log_table(
    conn: &mut dyn DatabaseConnection,
    ddl: &str,
) -> RevisionResult<SchemaStatus> {
    match conn.execute(ddl, &[]).await {
        Ok(_) => Ok(SchemaStatus::Created),
        Err(err) if err.to_string().contains("already exists") => {
            Ok(SchemaStatus::AlreadyInitialized)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(DatabaseValue::from(42i64), DatabaseValue::Int64(42));
        assert_eq!(DatabaseValue::from("x"), DatabaseValue::String("x".into()));
        assert!(DatabaseValue::from(Option::<i64>::None).is_null());
        assert_eq!(
            DatabaseValue::from(Some("y".to_string())),
            DatabaseValue::String("y".into())
        );
    }
}
