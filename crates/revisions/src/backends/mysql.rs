//! MySQL dialect
//!
//! MySQL understands `?` placeholders natively.

use async_trait::async_trait;

use super::core::{create_log_table, DatabaseConnection, Dialect, SchemaStatus};
use crate::error::RevisionResult;

const INIT_SQL: &str = "CREATE TABLE elif_revisions (
    slug         VARCHAR(255) NOT NULL UNIQUE,
    author       TEXT NOT NULL,
    comment      TEXT NOT NULL,
    statements   TEXT NOT NULL,
    performed_at BIGINT NOT NULL
)";

#[derive(Debug, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dialect for MySqlDialect {
    fn parameterize(&self, sql: &str) -> String {
        sql.to_string()
    }

    async fn init_schema(&self, conn: &mut dyn DatabaseConnection) -> RevisionResult<SchemaStatus> {
        create_log_table(conn, INIT_SQL).await
    }
}
