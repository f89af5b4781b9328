//! Execution engine
//!
//! Checks the log, executes and records revisions one at a time over a bound
//! [`Backend`]. Each revision ends either skipped (already in the log),
//! performed, or failed.
//!
//! Executing a revision and inserting its log row are two separate
//! statements. If the process dies between them the schema change is applied
//! but not logged, and the next run will try to apply it again.

use chrono::{TimeZone, Utc};
use std::fmt;
use thiserror::Error;

use crate::backends::{Backend, DatabaseRow, DatabaseRowExt};
use crate::collection::Collection;
use crate::error::{RevisionError, RevisionResult};
use crate::revision::{parse_id, split_slug, Revision};

/// Table holding one row per performed revision
pub const LOG_TABLE: &str = "elif_revisions";

/// Longest slug every built-in log table accepts
pub const MAX_SLUG_LEN: usize = 255;

const COLUMNS: &str = "slug, author, comment, statements, performed_at";

/// Whether the revision's slug is already in the log
pub async fn is_performed(backend: &mut Backend, revision: &Revision) -> RevisionResult<bool> {
    parse_id(&revision.id)?;

    let slug = revision.slug();
    let sql = backend.parameterize(&format!(
        "SELECT COUNT(slug) FROM {} WHERE (slug = ?)",
        LOG_TABLE
    ));

    let row = backend
        .connection()
        .fetch_optional(&sql, &[slug.as_str().into()])
        .await
        .map_err(|e| RevisionError::for_revision(&slug, e))?;

    let count = match row {
        Some(row) => row.get_i64(0)?,
        None => 0,
    };
    Ok(count > 0)
}

/// Perform a single revision
///
/// A revision without SQL is a no-op and never touches the log. A revision
/// already in the log returns [`RevisionError::AlreadyPerformed`].
pub async fn perform(backend: &mut Backend, revision: &Revision) -> RevisionResult<()> {
    let slug = revision.slug();

    if revision.is_empty() {
        tracing::debug!(target: "elif::revisions", "Revision {} has no SQL, nothing to do", slug);
        return Ok(());
    }

    // The log table's slug column is bounded.
    if slug.chars().count() > MAX_SLUG_LEN {
        return Err(RevisionError::SlugTooLong {
            slug,
            max: MAX_SLUG_LEN,
        });
    }

    if is_performed(backend, revision).await? {
        tracing::debug!(target: "elif::revisions", "Revision {} already performed", slug);
        return Err(RevisionError::AlreadyPerformed(slug));
    }

    backend
        .connection()
        .execute(&revision.sql, &[])
        .await
        .map_err(|e| RevisionError::for_revision(&slug, e))?;

    let insert = backend.parameterize(&format!(
        "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?)",
        LOG_TABLE, COLUMNS
    ));
    let params = [
        slug.as_str().into(),
        revision.author.as_str().into(),
        revision.comment.as_str().into(),
        revision.sql.as_str().into(),
        Utc::now().timestamp().into(),
    ];

    if let Err(err) = backend.connection().execute(&insert, &params).await {
        tracing::error!(
            target: "elif::revisions",
            "Revision {} was applied but could not be logged: {}",
            slug,
            err
        );
        return Err(RevisionError::for_revision(&slug, err));
    }

    tracing::info!(target: "elif::revisions", "Performed revision {}", slug);
    Ok(())
}

/// Outcome of a batch that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Slugs executed and logged by this batch, in order
    pub performed: Vec<String>,
    /// Slugs skipped because they were already performed
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Number of benign skips
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slug in &self.skipped {
            writeln!(f, "{}", RevisionError::AlreadyPerformed(slug.clone()))?;
        }
        Ok(())
    }
}

/// A fatal batch failure together with what happened before it
#[derive(Debug, Error)]
#[error("{error}")]
pub struct BatchError {
    #[source]
    pub error: RevisionError,
    /// Revisions performed and skipped before the failure
    pub report: BatchReport,
}

impl BatchError {
    /// The fatal error alone
    pub fn into_inner(self) -> RevisionError {
        self.error
    }
}

/// Perform revisions in ascending id order
///
/// Already-performed revisions are collected in the report and the batch
/// moves on. Any other error stops the batch at that revision.
pub async fn perform_batch<I>(backend: &mut Backend, revisions: I) -> Result<BatchReport, BatchError>
where
    I: IntoIterator<Item = Revision>,
{
    let mut report = BatchReport::default();

    let mut collection = match Collection::from_revisions(revisions) {
        Ok(collection) => collection,
        Err(error) => return Err(BatchError { error, report }),
    };

    tracing::debug!(
        target: "elif::revisions",
        "Performing {} revision(s) against {}",
        collection.len(),
        backend.type_name()
    );

    for revision in collection.drain() {
        match perform(backend, &revision).await {
            Ok(()) => {
                if !revision.is_empty() {
                    report.performed.push(revision.slug());
                }
            }
            Err(RevisionError::AlreadyPerformed(slug)) => {
                tracing::warn!(target: "elif::revisions", "Skipping revision {}: already performed", slug);
                report.skipped.push(slug);
            }
            Err(error) => return Err(BatchError { error, report }),
        }
    }

    Ok(report)
}

/// Read one performed revision from the log
pub async fn get_revision(backend: &mut Backend, slug: &str) -> RevisionResult<Revision> {
    let sql = backend.parameterize(&format!(
        "SELECT {} FROM {} WHERE (slug = ?)",
        COLUMNS, LOG_TABLE
    ));

    let row = backend
        .connection()
        .fetch_optional(&sql, &[slug.into()])
        .await?
        .ok_or_else(|| RevisionError::NotFound(slug.to_string()))?;

    revision_from_row(row.as_ref())
}

/// Read performed revisions, most recently performed first
///
/// `limit <= 0` returns every row.
pub async fn get_revisions(backend: &mut Backend, limit: i64) -> RevisionResult<Vec<Revision>> {
    let mut count = limit;

    if count <= 0 {
        let sql = format!("SELECT COUNT(*) FROM {}", LOG_TABLE);
        count = match backend.connection().fetch_optional(&sql, &[]).await? {
            Some(row) => row.get_i64(0)?,
            None => 0,
        };
    }

    if count <= 0 {
        return Ok(Vec::new());
    }

    let sql = backend.parameterize(&format!(
        "SELECT {} FROM {} ORDER BY performed_at DESC, slug DESC LIMIT ?",
        COLUMNS, LOG_TABLE
    ));

    let rows = backend.connection().fetch_all(&sql, &[count.into()]).await?;

    rows.iter().map(|row| revision_from_row(row.as_ref())).collect()
}

fn revision_from_row(row: &dyn DatabaseRow) -> RevisionResult<Revision> {
    let slug = row.get_string(0)?;
    let (category, id) = split_slug(&slug);

    let seconds = row.get_i64(4)?;
    let performed_at = Utc
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| RevisionError::Database(format!("invalid performed_at {}", seconds)))?;

    Ok(Revision {
        id: id.to_string(),
        category: category.to_string(),
        author: row.get_string(1)?,
        comment: row.get_string(2)?,
        sql: row.get_string(3)?,
        performed_at: Some(performed_at),
    })
}
