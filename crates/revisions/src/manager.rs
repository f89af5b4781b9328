//! Revision Manager - File system operations for revisions
//!
//! Revisions live as `<revisions_dir>/<slug>.sql`, so a category is a
//! sub-directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::{RevisionError, RevisionResult};
use crate::revision::Revision;

const EXTENSION: &str = "sql";

/// Where revision files are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionConfig {
    pub revisions_dir: PathBuf,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            revisions_dir: PathBuf::from("revisions"),
        }
    }
}

/// Revision manager for creating and loading revision files
#[derive(Debug, Clone, Default)]
pub struct RevisionManager {
    config: RevisionConfig,
}

impl RevisionManager {
    /// Create a new manager with default configuration
    pub fn new() -> Self {
        Self::with_config(RevisionConfig::default())
    }

    pub fn with_config(config: RevisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RevisionConfig {
        &self.config
    }

    /// File holding the revision with the given slug
    pub fn revision_path(&self, slug: &str) -> PathBuf {
        self.config
            .revisions_dir
            .join(format!("{}.{}", slug, EXTENSION))
    }

    /// Create a new revision file stamped with the current time
    ///
    /// Fails if a file with the same slug already exists.
    pub fn create_revision(
        &self,
        category: &str,
        author: &str,
        comment: &str,
    ) -> RevisionResult<(Revision, PathBuf)> {
        let revision = Revision::with_category(category, author, comment);
        let path = self.create_file(&revision)?;

        tracing::debug!(target: "elif::revisions", "Created revision file {}", path.display());
        Ok((revision, path))
    }

    fn create_file(&self, revision: &Revision) -> RevisionResult<PathBuf> {
        let path = self.revision_path(&revision.slug());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => RevisionError::Configuration(format!(
                    "revision file {} already exists",
                    path.display()
                )),
                _ => RevisionError::Io(e),
            })?;
        file.write_all(revision.to_string().as_bytes())?;

        Ok(path)
    }

    /// Read the revision with the given slug from disk
    pub fn open_revision(&self, slug: &str) -> RevisionResult<Revision> {
        let path = self.revision_path(slug);

        let source = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RevisionError::NotFound(slug.to_string()),
            _ => RevisionError::Io(e),
        })?;

        Revision::parse(&source).map_err(|e| RevisionError::for_revision(slug, e))
    }

    /// Load every revision under the revisions directory, in id order
    pub fn load_revisions(&self) -> RevisionResult<Vec<Revision>> {
        let dir = &self.config.revisions_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        collect_files(dir, &mut files)?;

        let mut collection = Collection::new();
        for path in files {
            let source = fs::read_to_string(&path)?;
            let revision = Revision::parse(&source)
                .map_err(|e| RevisionError::for_revision(path.display().to_string(), e))?;
            collection.put(revision)?;
        }

        Ok(collection.drain())
    }

    /// Write a revision to its file, replacing any existing content
    pub fn write_revision(&self, revision: &Revision) -> RevisionResult<PathBuf> {
        let path = self.revision_path(&revision.slug());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, revision.to_string())?;

        Ok(path)
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> RevisionResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.extension().map_or(false, |ext| ext == EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> RevisionManager {
        RevisionManager::with_config(RevisionConfig {
            revisions_dir: dir.path().join("revisions"),
        })
    }

    fn revision(category: &str, id: &str, sql: &str) -> Revision {
        Revision {
            id: id.to_string(),
            category: category.to_string(),
            author: "Jane".to_string(),
            comment: format!("revision {}", id),
            sql: sql.to_string(),
            performed_at: None,
        }
    }

    #[test]
    fn test_revision_path() {
        let manager = RevisionManager::new();

        assert_eq!(
            manager.revision_path("20060102150405"),
            PathBuf::from("revisions/20060102150405.sql")
        );
        assert_eq!(
            manager.revision_path("auth/20060102150405"),
            PathBuf::from("revisions/auth/20060102150405.sql")
        );
    }

    #[test]
    fn test_create_and_open_revision() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        let (created, path) = manager
            .create_revision("auth", "Jane <jane@example.com>", "Add users")
            .unwrap();
        assert!(path.exists());
        assert!(path.starts_with(dir.path().join("revisions/auth")));

        let opened = manager.open_revision(&created.slug()).unwrap();
        assert_eq!(opened, created);
        assert!(opened.is_empty());
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        let first = revision("", "20060102150405", "SELECT 1;");
        manager.create_file(&first).unwrap();

        let second = revision("", "20060102150405", "SELECT 2;");
        let err = manager.create_file(&second).unwrap_err();
        assert!(matches!(err, RevisionError::Configuration(_)));

        assert_eq!(manager.open_revision("20060102150405").unwrap().sql, "SELECT 1;");
    }

    #[test]
    fn test_open_missing_revision() {
        let dir = TempDir::new().unwrap();
        let err = manager(&dir).open_revision("20060102150405").unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_revisions_sorted_and_recursive() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        manager
            .write_revision(&revision("", "20060102150407", "SELECT 3;"))
            .unwrap();
        manager
            .write_revision(&revision("auth", "20060102150405", "SELECT 1;"))
            .unwrap();
        manager
            .write_revision(&revision("billing/eu", "20060102150406", "SELECT 2;"))
            .unwrap();
        fs::write(dir.path().join("revisions/README.md"), "not a revision").unwrap();

        let slugs: Vec<String> = manager
            .load_revisions()
            .unwrap()
            .iter()
            .map(Revision::slug)
            .collect();

        assert_eq!(
            slugs,
            vec![
                "auth/20060102150405",
                "billing/eu/20060102150406",
                "20060102150407",
            ]
        );
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();

        assert!(manager(&dir).load_revisions().unwrap().is_empty());
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        fs::create_dir_all(dir.path().join("revisions")).unwrap();
        fs::write(dir.path().join("revisions/broken.sql"), "SELECT 1;").unwrap();

        let err = manager.load_revisions().unwrap_err();
        match err {
            RevisionError::Failed { slug, source } => {
                assert!(slug.ends_with("broken.sql"));
                assert!(matches!(*source, RevisionError::MalformedHeader(_)));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_write_revision_overwrites() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);

        let mut rev = revision("", "20060102150405", "SELECT 1;");
        manager.write_revision(&rev).unwrap();
        rev.sql = "SELECT 2;".to_string();
        manager.write_revision(&rev).unwrap();

        assert_eq!(manager.open_revision("20060102150405").unwrap().sql, "SELECT 2;");
    }
}
