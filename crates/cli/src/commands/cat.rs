use elif_revisions::RevisionManager;

/// Print local revisions, or only their SQL
pub fn run(manager: &RevisionManager, slugs: &[String], sql_only: bool) -> anyhow::Result<()> {
    for slug in slugs {
        let revision = manager.open_revision(slug)?;

        if sql_only {
            println!("{}", revision.sql);
        } else {
            print!("{}", revision);
        }
    }
    Ok(())
}
