use anyhow::{bail, Context};
use elif_revisions::RevisionManager;
use std::env;
use std::process::Command;

use crate::author::current_author;

/// Create a new revision file and open it in `$EDITOR` when set
pub fn run(
    manager: &RevisionManager,
    category: Option<&str>,
    comment: Option<&str>,
) -> anyhow::Result<()> {
    let author = current_author()?;
    let (revision, path) = manager
        .create_revision(category.unwrap_or(""), &author, comment.unwrap_or(""))
        .context("failed to create revision")?;

    if let Ok(editor) = env::var("EDITOR") {
        if !editor.trim().is_empty() {
            let status = Command::new(&editor)
                .arg(&path)
                .status()
                .with_context(|| format!("failed to start editor {}", editor))?;

            if !status.success() {
                bail!("editor {} exited with {}", editor, status);
            }
        }
    }

    println!("revision created {}", revision.slug());
    Ok(())
}
