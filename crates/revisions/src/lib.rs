//! # elif-revisions: Ordered SQL revisions for elif.rs
//!
//! Applies timestamp-ordered SQL revisions to a database at most once each,
//! recording every performed revision in a log table (`elif_revisions`)
//! inside the target database.
//!
//! PostgreSQL, MySQL and SQLite are built in; other databases plug in
//! through [`Dialect`] and [`BackendRegistry::register`].

pub mod backends;
pub mod collection;
pub mod engine;
pub mod error;
pub mod manager;
pub mod revision;

// Re-export core types
pub use backends::{
    connect, detect_type, init_registry, open, registry, Backend, BackendRegistry, DatabaseConnection,
    DatabaseRow, DatabaseRowExt, DatabaseValue, Dialect, MySqlDialect, PostgresDialect,
    SchemaStatus, SqliteDialect, MYSQL, POSTGRESQL, SQLITE3,
};
pub use collection::*;
pub use engine::*;
pub use error::*;
pub use manager::*;
pub use revision::*;
