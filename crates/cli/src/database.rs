use anyhow::{bail, Context};
use clap::Args;
use elif_revisions::{connect, detect_type, Backend};

use crate::config::ProjectConfig;

/// Flags selecting the database a command runs against
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    /// Database type: postgresql, mysql or sqlite3 (inferred from --dsn when omitted)
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Data source name of the database
    #[arg(long)]
    pub dsn: Option<String>,

    /// Named database from the config file
    #[arg(long, conflicts_with_all = ["kind", "dsn"])]
    pub db: Option<String>,
}

/// A resolved database type and DSN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub kind: String,
    pub dsn: String,
}

impl DatabaseArgs {
    pub fn resolve(&self, config: &ProjectConfig) -> anyhow::Result<DatabaseTarget> {
        if let Some(name) = &self.db {
            let db = config.database(name)?;
            return Ok(DatabaseTarget {
                kind: db.kind.clone(),
                dsn: db.dsn.clone(),
            });
        }

        let dsn = match &self.dsn {
            Some(dsn) if !dsn.is_empty() => dsn.clone(),
            _ => bail!("database not specified, pass --dsn or --db"),
        };

        let kind = match &self.kind {
            Some(kind) => kind.clone(),
            None => match detect_type(&dsn) {
                Some(kind) => kind.to_string(),
                None => bail!("cannot infer database type from dsn, pass --type"),
            },
        };

        Ok(DatabaseTarget { kind, dsn })
    }
}

impl DatabaseTarget {
    /// Connect and bind the dialect registered for this type
    pub async fn connect(&self) -> anyhow::Result<Backend> {
        let conn = connect(&self.kind, &self.dsn)
            .await
            .with_context(|| format!("failed to connect to {} database", self.kind))?;

        Ok(elif_revisions::open(&self.kind, conn)?)
    }

    /// Connect and make sure the revision log exists
    pub async fn open(&self) -> anyhow::Result<Backend> {
        let mut backend = self.connect().await?;
        backend.init_schema().await?;
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn args(kind: Option<&str>, dsn: Option<&str>, db: Option<&str>) -> DatabaseArgs {
        DatabaseArgs {
            kind: kind.map(String::from),
            dsn: dsn.map(String::from),
            db: db.map(String::from),
        }
    }

    #[test]
    fn test_resolve_explicit() {
        let target = args(Some("sqlite3"), Some("dev.db"), None)
            .resolve(&ProjectConfig::default())
            .unwrap();

        assert_eq!(target.kind, "sqlite3");
        assert_eq!(target.dsn, "dev.db");
    }

    #[test]
    fn test_resolve_infers_type() {
        let target = args(None, Some("postgres://localhost/app"), None)
            .resolve(&ProjectConfig::default())
            .unwrap();
        assert_eq!(target.kind, "postgresql");

        let err = args(None, Some("dev.db"), None)
            .resolve(&ProjectConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("--type"));
    }

    #[test]
    fn test_resolve_named() {
        let mut config = ProjectConfig::default();
        config.databases.insert(
            "local".to_string(),
            DatabaseConfig {
                kind: "sqlite3".to_string(),
                dsn: "sqlite://dev.db".to_string(),
            },
        );

        let target = args(None, None, Some("local")).resolve(&config).unwrap();
        assert_eq!(
            target,
            DatabaseTarget {
                kind: "sqlite3".to_string(),
                dsn: "sqlite://dev.db".to_string(),
            }
        );

        assert!(args(None, None, Some("prod")).resolve(&config).is_err());
    }

    #[test]
    fn test_resolve_requires_dsn() {
        let err = args(Some("mysql"), None, None)
            .resolve(&ProjectConfig::default())
            .unwrap_err();

        assert!(err.to_string().contains("database not specified"));
    }
}
