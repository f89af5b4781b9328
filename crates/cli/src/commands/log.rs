use elif_revisions::{get_revisions, Revision};

use crate::database::DatabaseTarget;

const PERFORMED_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Print performed revisions, most recent first
pub async fn run(target: &DatabaseTarget, limit: i64, json: bool) -> anyhow::Result<()> {
    let mut backend = target.open().await?;
    let revisions = get_revisions(&mut backend, limit).await;
    backend.close().await?;
    let revisions = revisions?;

    if json {
        println!("{}", serde_json::to_string_pretty(&revisions)?);
        return Ok(());
    }

    for revision in &revisions {
        print!("{}", render(revision, false));
    }
    Ok(())
}

/// Human readable form of a performed revision
pub fn render(revision: &Revision, with_comment: bool) -> String {
    let performed = revision
        .performed_at
        .map(|at| at.format(PERFORMED_FORMAT).to_string())
        .unwrap_or_default();

    let mut out = format!(
        "revision {}\nAuthor:    {}\nPerformed: {}\n\n",
        revision.slug(),
        revision.author,
        performed
    );

    if with_comment {
        out.push_str(&indent(&revision.comment));
        out.push('\n');
    }
    out.push_str(&indent(&revision.sql));
    out.push('\n');
    out
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}\n", line)).collect()
}
