use elif_revisions::{get_revisions, RevisionManager};

use crate::database::DatabaseTarget;

/// Overwrite local revision files with what the database has performed
pub async fn run(manager: &RevisionManager, target: &DatabaseTarget) -> anyhow::Result<()> {
    let mut backend = target.open().await?;
    let revisions = get_revisions(&mut backend, 0).await;
    backend.close().await?;

    for revision in revisions? {
        let path = manager.write_revision(&revision)?;
        tracing::info!(target: "elif::cli", "Synced {} to {}", revision.slug(), path.display());
        println!("{}", path.display());
    }
    Ok(())
}
