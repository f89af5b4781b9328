//! PostgreSQL dialect
//!
//! PostgreSQL uses numbered `$n` placeholders instead of `?`.

use async_trait::async_trait;

use super::core::{create_log_table, DatabaseConnection, Dialect, SchemaStatus};
use crate::error::RevisionResult;

const INIT_SQL: &str = "CREATE TABLE elif_revisions (
    slug         TEXT NOT NULL UNIQUE,
    author       TEXT NOT NULL,
    comment      TEXT NOT NULL,
    statements   TEXT NOT NULL,
    performed_at BIGINT NOT NULL
)";

#[derive(Debug, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dialect for PostgresDialect {
    fn parameterize(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);

        for (n, part) in sql.split('?').enumerate() {
            if n > 0 {
                out.push('$');
                out.push_str(&n.to_string());
            }
            out.push_str(part);
        }
        out
    }

    async fn init_schema(&self, conn: &mut dyn DatabaseConnection) -> RevisionResult<SchemaStatus> {
        create_log_table(conn, INIT_SQL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameterize() {
        let dialect = PostgresDialect::new();

        assert_eq!(
            dialect.parameterize("INSERT INTO t (a, b, c) VALUES (?, ?, ?)"),
            "INSERT INTO t (a, b, c) VALUES ($1, $2, $3)"
        );
        assert_eq!(
            dialect.parameterize("SELECT COUNT(slug) FROM t WHERE (slug = ?)"),
            "SELECT COUNT(slug) FROM t WHERE (slug = $1)"
        );
        assert_eq!(dialect.parameterize("SELECT 1"), "SELECT 1");
        assert_eq!(dialect.parameterize("??"), "$1$2");
        assert_eq!(dialect.parameterize(""), "");
    }

    #[test]
    fn test_log_table_text_columns() {
        assert!(!INIT_SQL.contains("VARCHAR"));
        assert!(INIT_SQL.contains("author       TEXT NOT NULL"));
    }

    #[test]
    fn test_parameterize_past_nine() {
        let dialect = PostgresDialect::new();
        let sql = vec!["?"; 11].join(",");

        assert_eq!(
            dialect.parameterize(&sql),
            "$1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11"
        );
    }
}
