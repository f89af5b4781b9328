//! sqlx driver adapters
//!
//! Wraps a single sqlx connection per database type behind
//! [`DatabaseConnection`]. No pooling: a batch owns its connection.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Row};

use super::core::{DatabaseConnection, DatabaseRow, DatabaseValue};
use super::registry::{MYSQL, POSTGRESQL, SQLITE3};
use crate::error::{RevisionError, RevisionResult};

macro_rules! sqlx_connection {
    ($name:ident, $row_name:ident, $conn:ty, $row:ty) => {
        pub struct $name {
            conn: $conn,
        }

        impl $name {
            pub fn new(conn: $conn) -> Self {
                Self { conn }
            }
        }

        #[async_trait]
        impl DatabaseConnection for $name {
            async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> RevisionResult<u64> {
                if params.is_empty() {
                    let result = sqlx::Executor::execute(&mut self.conn, sql).await?;
                    return Ok(result.rows_affected());
                }

                let mut query = sqlx::query(sql);
                for param in params {
                    query = match param {
                        DatabaseValue::Null => query.bind(Option::<String>::None),
                        DatabaseValue::Int64(i) => query.bind(*i),
                        DatabaseValue::String(s) => query.bind(s.clone()),
                    };
                }

                let result = query.execute(&mut self.conn).await?;
                Ok(result.rows_affected())
            }

            async fn fetch_all(
                &mut self,
                sql: &str,
                params: &[DatabaseValue],
            ) -> RevisionResult<Vec<Box<dyn DatabaseRow>>> {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = match param {
                        DatabaseValue::Null => query.bind(Option::<String>::None),
                        DatabaseValue::Int64(i) => query.bind(*i),
                        DatabaseValue::String(s) => query.bind(s.clone()),
                    };
                }

                let rows = query.fetch_all(&mut self.conn).await?;
                Ok(rows
                    .into_iter()
                    .map(|row| Box::new($row_name { row }) as Box<dyn DatabaseRow>)
                    .collect())
            }

            async fn fetch_optional(
                &mut self,
                sql: &str,
                params: &[DatabaseValue],
            ) -> RevisionResult<Option<Box<dyn DatabaseRow>>> {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = match param {
                        DatabaseValue::Null => query.bind(Option::<String>::None),
                        DatabaseValue::Int64(i) => query.bind(*i),
                        DatabaseValue::String(s) => query.bind(s.clone()),
                    };
                }

                let row = query.fetch_optional(&mut self.conn).await?;
                Ok(row.map(|row| Box::new($row_name { row }) as Box<dyn DatabaseRow>))
            }

            async fn close(self: Box<Self>) -> RevisionResult<()> {
                self.conn.close().await?;
                Ok(())
            }
        }

        struct $row_name {
            row: $row,
        }

        impl DatabaseRow for $row_name {
            fn get_by_index(&self, index: usize) -> RevisionResult<DatabaseValue> {
                if index >= self.row.len() {
                    return Err(RevisionError::Database(format!(
                        "column index {} out of range",
                        index
                    )));
                }

                // Integers first; text columns fail the type check and fall through.
                if let Ok(value) = self.row.try_get::<Option<i64>, _>(index) {
                    return Ok(value.map_or(DatabaseValue::Null, DatabaseValue::Int64));
                }

                let value: Option<String> = self.row.try_get(index)?;
                Ok(value.map_or(DatabaseValue::Null, DatabaseValue::String))
            }

            fn column_count(&self) -> usize {
                self.row.len()
            }
        }
    };
}

sqlx_connection!(PostgresConnection, PostgresRow, sqlx::PgConnection, sqlx::postgres::PgRow);
sqlx_connection!(MySqlConnection, MySqlRow, sqlx::MySqlConnection, sqlx::mysql::MySqlRow);
sqlx_connection!(SqliteConnection, SqliteRow, sqlx::SqliteConnection, sqlx::sqlite::SqliteRow);

impl PostgresConnection {
    pub async fn connect(dsn: &str) -> RevisionResult<Self> {
        Ok(Self::new(sqlx::PgConnection::connect(dsn).await?))
    }
}

impl MySqlConnection {
    pub async fn connect(dsn: &str) -> RevisionResult<Self> {
        Ok(Self::new(sqlx::MySqlConnection::connect(dsn).await?))
    }
}

impl SqliteConnection {
    /// Open a SQLite database, creating the file when it is missing
    pub async fn connect(dsn: &str) -> RevisionResult<Self> {
        let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);
        Ok(Self::new(options.connect().await?))
    }
}

/// Open a raw connection for one of the built-in database types
pub async fn connect(type_name: &str, dsn: &str) -> RevisionResult<Box<dyn DatabaseConnection>> {
    tracing::debug!(target: "elif::revisions", "Connecting to {} database", type_name);

    match type_name {
        POSTGRESQL => Ok(Box::new(PostgresConnection::connect(dsn).await?)),
        MYSQL => Ok(Box::new(MySqlConnection::connect(dsn).await?)),
        SQLITE3 => Ok(Box::new(SqliteConnection::connect(dsn).await?)),
        other => Err(RevisionError::UnknownBackend(other.to_string())),
    }
}

/// Detect the built-in database type from a DSN scheme
pub fn detect_type(dsn: &str) -> Option<&'static str> {
    if dsn.starts_with("postgresql://") || dsn.starts_with("postgres://") {
        Some(POSTGRESQL)
    } else if dsn.starts_with("mysql://") {
        Some(MYSQL)
    } else if dsn.starts_with("sqlite:") || dsn.starts_with("file:") {
        Some(SQLITE3)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::core::DatabaseRowExt;

    #[test]
    fn test_detect_type() {
        assert_eq!(detect_type("postgres://localhost/db"), Some(POSTGRESQL));
        assert_eq!(detect_type("postgresql://u:p@host:5432/db"), Some(POSTGRESQL));
        assert_eq!(detect_type("mysql://root@localhost/db"), Some(MYSQL));
        assert_eq!(detect_type("sqlite::memory:"), Some(SQLITE3));
        assert_eq!(detect_type("host=localhost dbname=db"), None);
    }

    #[tokio::test]
    async fn test_sqlite_round_trip_values() {
        let mut conn = connect(SQLITE3, "sqlite::memory:").await.unwrap();

        conn.execute(
            "CREATE TABLE t (name TEXT, n INTEGER, note TEXT); CREATE TABLE u (id INTEGER);",
            &[],
        )
        .await
        .unwrap();

        let affected = conn
            .execute(
                "INSERT INTO t (name, n, note) VALUES (?, ?, ?)",
                &["a".into(), 7i64.into(), DatabaseValue::Null],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = conn
            .fetch_optional("SELECT name, n, note FROM t WHERE name = ?", &["a".into()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.column_count(), 3);
        assert_eq!(row.get_string(0).unwrap(), "a");
        assert_eq!(row.get_i64(1).unwrap(), 7);
        assert!(row.get_by_index(2).unwrap().is_null());
        assert!(row.get_by_index(3).is_err());

        let missing = conn
            .fetch_optional("SELECT name FROM t WHERE name = ?", &["b".into()])
            .await
            .unwrap();
        assert!(missing.is_none());

        let all = conn.fetch_all("SELECT id FROM u", &[]).await.unwrap();
        assert!(all.is_empty());

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_unknown_type() {
        let err = connect("oracle", "whatever").await.err().unwrap();
        assert!(matches!(err, RevisionError::UnknownBackend(_)));
    }
}
