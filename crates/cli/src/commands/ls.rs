use elif_revisions::{Revision, RevisionManager};

/// List local revisions, optionally only one category
pub fn run(manager: &RevisionManager, category: Option<&str>) -> anyhow::Result<()> {
    let revisions = manager.load_revisions()?;

    for line in listing(&revisions, category) {
        println!("{}", line);
    }
    Ok(())
}

/// `slug: author - title`, authors padded to the widest one
fn listing(revisions: &[Revision], category: Option<&str>) -> Vec<String> {
    let pad = revisions
        .iter()
        .map(|rev| rev.author.chars().count())
        .max()
        .unwrap_or(0);

    revisions
        .iter()
        .filter(|rev| category.map_or(true, |c| rev.category == c))
        .map(|rev| {
            if rev.comment.is_empty() {
                format!("{}: {}", rev.slug(), rev.author)
            } else {
                format!("{}: {:<pad$} - {}", rev.slug(), rev.author, rev.title(), pad = pad)
            }
        })
        .collect()
}
