//! Database Backend Abstractions
//!
//! Dialects for each supported database type, the registry that maps type
//! names to them, and the sqlx adapters that provide raw connections.

pub mod core;
pub mod drivers;
pub mod mysql;
pub mod postgres;
pub mod registry;
pub mod sqlite;

// Re-export core traits and types
pub use self::core::*;
pub use drivers::{connect, detect_type};
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use registry::{
    init_registry, open, registry, Backend, BackendRegistry, MYSQL, POSTGRESQL, SQLITE3,
};
pub use sqlite::SqliteDialect;
