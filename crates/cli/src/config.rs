use anyhow::{bail, Context};
use elif_revisions::RevisionConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "revisions.toml";

/// Project configuration kept in `revisions.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub revisions_dir: PathBuf,
    pub databases: BTreeMap<String, DatabaseConfig>,
}

/// A named database connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub dsn: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            revisions_dir: RevisionConfig::default().revisions_dir,
            databases: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Load the config file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn revision_config(&self) -> RevisionConfig {
        RevisionConfig {
            revisions_dir: self.revisions_dir.clone(),
        }
    }

    pub fn database(&self, name: &str) -> anyhow::Result<&DatabaseConfig> {
        match self.databases.get(name) {
            Some(db) => Ok(db),
            None => bail!("database {} does not exist", name),
        }
    }
}
