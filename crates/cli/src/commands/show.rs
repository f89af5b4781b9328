use anyhow::Context;
use elif_revisions::{get_revision, get_revisions};

use super::log::render;
use crate::database::DatabaseTarget;

/// Print one performed revision, the latest when no slug is given
pub async fn run(target: &DatabaseTarget, slug: Option<&str>) -> anyhow::Result<()> {
    let mut backend = target.open().await?;

    let revision = match slug {
        Some(slug) => get_revision(&mut backend, slug).await.map(Some),
        None => get_revisions(&mut backend, 1)
            .await
            .map(|revisions| revisions.into_iter().next()),
    };
    backend.close().await?;

    let revision = match revision {
        Ok(Some(revision)) => revision,
        Ok(None) => anyhow::bail!("no revisions performed"),
        Err(err) => return Err(err).context("failed to show revision"),
    };

    print!("{}", render(&revision, true));
    Ok(())
}
