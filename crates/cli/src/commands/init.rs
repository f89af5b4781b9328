use std::fs;
use std::path::Path;

use elif_revisions::SchemaStatus;

use crate::config::ProjectConfig;
use crate::database::DatabaseTarget;

/// Write the default config, create the revisions directory and, when a
/// database is given, its revision log
pub async fn run(
    config_path: &Path,
    config: &ProjectConfig,
    target: Option<DatabaseTarget>,
) -> anyhow::Result<()> {
    if !config_path.exists() {
        config.save(config_path)?;
        println!("Created {}", config_path.display());
    }

    if !config.revisions_dir.exists() {
        fs::create_dir_all(&config.revisions_dir)?;
        println!("Created {}", config.revisions_dir.display());
    }

    if let Some(target) = target {
        let mut backend = target.connect().await?;
        match backend.init_schema().await? {
            SchemaStatus::Created => println!("Initialized revision log in {} database", target.kind),
            SchemaStatus::AlreadyInitialized => println!("Revision log already initialized"),
        }
        backend.close().await?;
    }

    Ok(())
}
