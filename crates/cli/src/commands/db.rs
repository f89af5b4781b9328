use anyhow::bail;
use elif_revisions::detect_type;
use std::path::Path;

use crate::config::{DatabaseConfig, ProjectConfig};

/// Add or replace a named database connection
pub fn set(
    config_path: &Path,
    mut config: ProjectConfig,
    name: &str,
    kind: Option<&str>,
    dsn: &str,
) -> anyhow::Result<()> {
    let kind = match kind.or_else(|| detect_type(dsn)) {
        Some(kind) => kind.to_string(),
        None => bail!("cannot infer database type from dsn, pass --type"),
    };

    config.databases.insert(
        name.to_string(),
        DatabaseConfig {
            kind,
            dsn: dsn.to_string(),
        },
    );
    config.save(config_path)
}

pub fn ls(config: &ProjectConfig) -> anyhow::Result<()> {
    let pad = config.databases.keys().map(|name| name.len()).max().unwrap_or(0);

    for (name, db) in &config.databases {
        println!("{:<pad$} {} {}", name, db.kind, db.dsn, pad = pad);
    }
    Ok(())
}

pub fn rm(config_path: &Path, mut config: ProjectConfig, names: &[String]) -> anyhow::Result<()> {
    for name in names {
        if config.databases.remove(name).is_none() {
            bail!("database {} does not exist", name);
        }
    }
    config.save(config_path)
}
