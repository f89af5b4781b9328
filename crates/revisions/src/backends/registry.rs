//! Backend registry
//!
//! Maps a database type name to its [`Dialect`]. The registry is filled once
//! at startup and only read afterwards; [`init_registry`] installs it for the
//! whole process.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::core::{DatabaseConnection, Dialect, SchemaStatus};
use super::mysql::MySqlDialect;
use super::postgres::PostgresDialect;
use super::sqlite::SqliteDialect;
use crate::error::{RevisionError, RevisionResult};

pub const POSTGRESQL: &str = "postgresql";
pub const MYSQL: &str = "mysql";
pub const SQLITE3: &str = "sqlite3";

static REGISTRY: OnceCell<BackendRegistry> = OnceCell::new();

/// Append-only map from database type name to dialect
#[derive(Default)]
pub struct BackendRegistry {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the PostgreSQL, MySQL and SQLite dialects
    pub fn with_builtin() -> Self {
        let mut dialects: HashMap<String, Arc<dyn Dialect>> = HashMap::new();
        dialects.insert(POSTGRESQL.to_string(), Arc::new(PostgresDialect::new()));
        dialects.insert(MYSQL.to_string(), Arc::new(MySqlDialect::new()));
        dialects.insert(SQLITE3.to_string(), Arc::new(SqliteDialect::new()));
        Self { dialects }
    }

    /// Register a dialect under a type name
    ///
    /// Names cannot be registered twice.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        dialect: Arc<dyn Dialect>,
    ) -> RevisionResult<()> {
        let type_name = type_name.into();

        if type_name.trim().is_empty() {
            return Err(RevisionError::Configuration(
                "database type name cannot be empty".to_string(),
            ));
        }

        if self.dialects.contains_key(&type_name) {
            return Err(RevisionError::Configuration(format!(
                "database already registered for {}",
                type_name
            )));
        }

        self.dialects.insert(type_name, dialect);
        Ok(())
    }

    /// Get the dialect registered for a type name
    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.get(type_name).cloned()
    }

    /// Bind a raw connection to the dialect of `type_name`
    ///
    /// Does not touch the database; call [`Backend::init_schema`] for that.
    pub fn open(
        &self,
        type_name: &str,
        conn: Box<dyn DatabaseConnection>,
    ) -> RevisionResult<Backend> {
        let dialect = self
            .get(type_name)
            .ok_or_else(|| RevisionError::UnknownBackend(type_name.to_string()))?;

        Ok(Backend {
            type_name: type_name.to_string(),
            dialect,
            conn,
        })
    }

    /// List all registered type names, sorted
    pub fn registered_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dialects.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Install the process-wide registry
///
/// Call once at startup, before any [`open`]. A second call is an error.
pub fn init_registry(registry: BackendRegistry) -> RevisionResult<()> {
    REGISTRY.set(registry).map_err(|_| {
        RevisionError::Configuration("backend registry already initialized".to_string())
    })
}

/// The process-wide registry
pub fn registry() -> RevisionResult<&'static BackendRegistry> {
    REGISTRY
        .get()
        .ok_or_else(|| RevisionError::Configuration("backend registry not initialized".to_string()))
}

/// Bind a raw connection through the process-wide registry
pub fn open(type_name: &str, conn: Box<dyn DatabaseConnection>) -> RevisionResult<Backend> {
    registry()?.open(type_name, conn)
}

/// A connection bound to its dialect
pub struct Backend {
    type_name: String,
    dialect: Arc<dyn Dialect>,
    conn: Box<dyn DatabaseConnection>,
}

impl Backend {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Rewrite `?` markers for this backend's dialect
    pub fn parameterize(&self, sql: &str) -> String {
        self.dialect.parameterize(sql)
    }

    /// Create the revision log table if it is missing
    pub async fn init_schema(&mut self) -> RevisionResult<SchemaStatus> {
        let status = self.dialect.init_schema(self.conn.as_mut()).await?;
        tracing::debug!(
            target: "elif::revisions",
            "Revision log on {}: {:?}",
            self.type_name,
            status
        );
        Ok(status)
    }

    /// The underlying connection
    pub fn connection(&mut self) -> &mut dyn DatabaseConnection {
        self.conn.as_mut()
    }

    /// Close the underlying connection
    pub async fn close(self) -> RevisionResult<()> {
        self.conn.close().await
    }
}
