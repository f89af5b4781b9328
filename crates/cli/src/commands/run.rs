use elif_revisions::{perform_batch, BatchReport, RevisionManager};

use crate::database::DatabaseTarget;

/// Perform the given revisions, or every local revision when none are given
pub async fn run(
    manager: &RevisionManager,
    target: &DatabaseTarget,
    slugs: &[String],
    verbose: bool,
) -> anyhow::Result<()> {
    let revisions = if slugs.is_empty() {
        manager.load_revisions()?
    } else {
        slugs
            .iter()
            .map(|slug| manager.open_revision(slug))
            .collect::<Result<Vec<_>, _>>()?
    };

    if revisions.is_empty() {
        tracing::debug!(target: "elif::cli", "No revisions to run");
        return Ok(());
    }

    let mut backend = target.open().await?;
    let result = perform_batch(&mut backend, revisions).await;
    backend.close().await?;

    match result {
        Ok(report) => {
            if verbose {
                print_report(&report);
            }
            Ok(())
        }
        Err(err) => {
            if verbose {
                print_report(&err.report);
            }
            Err(err.into_inner().into())
        }
    }
}

fn print_report(report: &BatchReport) {
    for slug in &report.performed {
        eprintln!("performed {}", slug);
    }
    eprint!("{}", report);
}
